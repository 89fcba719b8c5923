//! Per-request field casing.
//!
//! Callers may send transactions in the node's snake_case form or in camelCase. The form is detected
//! from the transaction object (`outputs_data` marks snake_case) unless the last param is the
//! selector `"snake"` or `"camel"`, and the response is written back in the same form. Only the keys
//! listed in `FIELDS` are renamed; everything else passes through untouched.

use serde_json::Value;
use swap_core::domain::ledger::json::JsonTransaction;
use swap_core::domain::ledger::Transaction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Case {
    Snake,
    Camel,
}

impl Case {
    pub fn as_str(self) -> &'static str {
        match self {
            Case::Snake => "snake",
            Case::Camel => "camel",
        }
    }

    pub fn from_selector(value: &Value) -> Option<Self> {
        match value.as_str() {
            Some("snake") => Some(Case::Snake),
            Some("camel") => Some(Case::Camel),
            _ => None,
        }
    }

    pub fn detect(tx: &Value) -> Self {
        if tx.get("outputs_data").is_some() {
            Case::Snake
        } else {
            Case::Camel
        }
    }
}

/// `(snake_case, camelCase)` for every key the API exchanges.
const FIELDS: &[(&str, &str)] = &[
    ("cell_deps", "cellDeps"),
    ("header_deps", "headerDeps"),
    ("outputs_data", "outputsData"),
    ("previous_output", "previousOutput"),
    ("out_point", "outPoint"),
    ("tx_hash", "txHash"),
    ("code_hash", "codeHash"),
    ("hash_type", "hashType"),
    ("dep_type", "depType"),
    ("valid_until", "validUntil"),
    ("ask_tokens", "askTokens"),
    ("bid_tokens", "bidTokens"),
    ("signed_tx", "signedTx"),
];

/// `dep_type` values spelled differently in the two forms.
const DEP_TYPE_VALUES: &[(&str, &str)] = &[("dep_group", "depGroup")];

fn rename<'a>(table: &'a [(&'a str, &'a str)], name: &'a str, case: Case) -> &'a str {
    table
        .iter()
        .find_map(|(snake, camel)| match case {
            Case::Snake if *camel == name => Some(*snake),
            Case::Camel if *snake == name => Some(*camel),
            _ => None,
        })
        .unwrap_or(name)
}

/// Rewrites the known keys of `value` (recursively) into `case`.
pub fn to_case(value: Value, case: Case) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let key = rename(FIELDS, &key, case).to_string();
                    let value = match value {
                        Value::String(text) if key == "dep_type" || key == "depType" => {
                            Value::String(rename(DEP_TYPE_VALUES, &text, case).to_string())
                        }
                        other => to_case(other, case),
                    };
                    (key, value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|item| to_case(item, case)).collect()),
        other => other,
    }
}

/// A transaction-first params array with the casing to answer in.
#[derive(Debug)]
pub struct CasedParams {
    pub case: Case,
    pub tx: Transaction,
    /// Params after the transaction, selector removed.
    pub rest: Vec<Value>,
}

pub fn parse_params(params: Option<Value>) -> Result<CasedParams, String> {
    let Some(Value::Array(mut params)) = params else {
        return Err("Params must be an array!".to_string());
    };
    let forced = params.last().and_then(Case::from_selector);
    if forced.is_some() {
        params.pop();
    }
    if params.is_empty() || !params[0].is_object() {
        return Err("The first element in params must be the tx object!".to_string());
    }
    let raw = params.remove(0);
    let detected = Case::detect(&raw);
    let json: JsonTransaction = serde_json::from_value(to_case(raw, Case::Snake)).map_err(|err| format!("invalid transaction: {err}"))?;
    Ok(CasedParams { case: forced.unwrap_or(detected), tx: Transaction::from(json), rest: params })
}

pub fn tx_to_value(tx: &Transaction, case: Case) -> Result<Value, serde_json::Error> {
    Ok(to_case(serde_json::to_value(JsonTransaction::from(tx))?, case))
}
