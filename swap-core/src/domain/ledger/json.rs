//! Node-RPC JSON form of the ledger types: snake_case keys, `0x` hex quantities and bytes.
//!
//! Quantities are also accepted as decimal strings or JSON numbers.

use crate::domain::ledger::types::{CellDep, CellInput, CellOutput, DepType, HashType, OutPoint, Script, Transaction};
use crate::foundation::util::encoding::{decode_hex, encode_hex_prefixed, format_quantity, parse_quantity};
use crate::foundation::{Byte32, TxHash};
use serde::{Deserialize, Serialize};

pub(crate) mod quantity {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Into<u128> + Copy,
    {
        serializer.serialize_str(&format_quantity((*value).into()))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u128>,
    {
        let value = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_quantity(&text).map_err(serde::de::Error::custom)?,
            Raw::Number(number) => u128::from(number),
        };
        T::try_from(value).map_err(|_| serde::de::Error::custom(format!("quantity {} out of range", value)))
    }
}

pub(crate) mod hex_bytes {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_hex_prefixed(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Hex byte string that serializes as `0x...`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonBytes(#[serde(with = "hex_bytes")] pub Vec<u8>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonScript {
    pub code_hash: Byte32,
    pub hash_type: HashType,
    pub args: JsonBytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOutPoint {
    pub tx_hash: TxHash,
    #[serde(with = "quantity")]
    pub index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonCellInput {
    #[serde(with = "quantity", default)]
    pub since: u64,
    pub previous_output: JsonOutPoint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonCellDep {
    pub out_point: JsonOutPoint,
    #[serde(default)]
    pub dep_type: DepType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonCellOutput {
    #[serde(with = "quantity")]
    pub capacity: u64,
    pub lock: JsonScript,
    #[serde(rename = "type", default)]
    pub type_: Option<JsonScript>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonTransaction {
    #[serde(with = "quantity", default)]
    pub version: u32,
    #[serde(default)]
    pub cell_deps: Vec<JsonCellDep>,
    #[serde(default)]
    pub header_deps: Vec<Byte32>,
    #[serde(default)]
    pub inputs: Vec<JsonCellInput>,
    #[serde(default)]
    pub outputs: Vec<JsonCellOutput>,
    #[serde(default)]
    pub outputs_data: Vec<JsonBytes>,
    #[serde(default)]
    pub witnesses: Vec<JsonBytes>,
}

impl From<&Script> for JsonScript {
    fn from(value: &Script) -> Self {
        Self { code_hash: value.code_hash, hash_type: value.hash_type, args: JsonBytes(value.args.clone()) }
    }
}

impl From<JsonScript> for Script {
    fn from(value: JsonScript) -> Self {
        Self { code_hash: value.code_hash, hash_type: value.hash_type, args: value.args.0 }
    }
}

impl From<&OutPoint> for JsonOutPoint {
    fn from(value: &OutPoint) -> Self {
        Self { tx_hash: value.tx_hash, index: value.index }
    }
}

impl From<JsonOutPoint> for OutPoint {
    fn from(value: JsonOutPoint) -> Self {
        Self { tx_hash: value.tx_hash, index: value.index }
    }
}

impl From<&CellOutput> for JsonCellOutput {
    fn from(value: &CellOutput) -> Self {
        Self { capacity: value.capacity, lock: (&value.lock).into(), type_: value.type_.as_ref().map(JsonScript::from) }
    }
}

impl From<JsonCellOutput> for CellOutput {
    fn from(value: JsonCellOutput) -> Self {
        Self { capacity: value.capacity, lock: value.lock.into(), type_: value.type_.map(Script::from) }
    }
}

impl From<&CellDep> for JsonCellDep {
    fn from(value: &CellDep) -> Self {
        Self { out_point: (&value.out_point).into(), dep_type: value.dep_type }
    }
}

impl From<JsonCellDep> for CellDep {
    fn from(value: JsonCellDep) -> Self {
        Self { out_point: value.out_point.into(), dep_type: value.dep_type }
    }
}

impl From<&Transaction> for JsonTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            version: tx.version,
            cell_deps: tx.cell_deps.iter().map(JsonCellDep::from).collect(),
            header_deps: tx.header_deps.clone(),
            inputs: tx
                .inputs
                .iter()
                .map(|input| JsonCellInput { since: input.since, previous_output: (&input.previous_output).into() })
                .collect(),
            outputs: tx.outputs.iter().map(JsonCellOutput::from).collect(),
            outputs_data: tx.outputs_data.iter().cloned().map(JsonBytes).collect(),
            witnesses: tx.witnesses.iter().cloned().map(JsonBytes).collect(),
        }
    }
}

impl From<JsonTransaction> for Transaction {
    fn from(tx: JsonTransaction) -> Self {
        let mut out = Self {
            version: tx.version,
            cell_deps: tx.cell_deps.into_iter().map(CellDep::from).collect(),
            header_deps: tx.header_deps,
            inputs: tx
                .inputs
                .into_iter()
                .map(|input| CellInput { since: input.since, previous_output: input.previous_output.into() })
                .collect(),
            outputs: tx.outputs.into_iter().map(CellOutput::from).collect(),
            outputs_data: tx.outputs_data.into_iter().map(|data| data.0).collect(),
            witnesses: tx.witnesses.into_iter().map(|witness| witness.0).collect(),
        };
        out.normalize_outputs_data();
        out
    }
}
