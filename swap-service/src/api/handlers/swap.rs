use super::types::{json_err, json_ok, swap_error, RpcErrorCode};
use crate::api::case::{parse_params, to_case, tx_to_value, Case, CasedParams};
use crate::api::state::RpcState;
use serde_json::{json, Value};
use swap_core::application::{ConfirmOutcome, InitiateOutcome, SwapService};
use swap_core::foundation::util::encoding::format_quantity;
use swap_core::foundation::util::time::to_rfc3339;
use tracing::{debug, info};

fn swap_service<'a>(state: &'a RpcState, id: &Value) -> Result<&'a SwapService, Value> {
    state.swap.as_deref().ok_or_else(|| json_err(id.clone(), RpcErrorCode::MethodNotFound, "method not found"))
}

fn cased_params(id: &Value, params: Option<Value>) -> Result<CasedParams, Value> {
    parse_params(params).map_err(|err| json_err(id.clone(), RpcErrorCode::InvalidParams, err))
}

/// Second param of `initiate`: the caller's asset output indices.
fn asset_indices(rest: &[Value]) -> Result<Vec<usize>, String> {
    let invalid = || "assetOutputIndices must be an array of output indices".to_string();
    let items = rest.first().and_then(Value::as_array).ok_or_else(invalid)?;
    items.iter().map(|item| item.as_u64().and_then(|index| usize::try_from(index).ok()).ok_or_else(invalid)).collect()
}

fn initiate_result(outcome: &InitiateOutcome, case: Case) -> Result<Value, serde_json::Error> {
    let result = json!({
        "valid_until": to_rfc3339(outcome.valid_until),
        "transaction": tx_to_value(&outcome.tx, Case::Snake)?,
        "ask_tokens": format_quantity(outcome.ask_tokens),
        "bid_tokens": format_quantity(u128::from(outcome.bid_tokens)),
    });
    Ok(to_case(result, case))
}

fn confirm_result(outcome: &ConfirmOutcome, case: Case) -> Result<Value, serde_json::Error> {
    Ok(json!({ "tx": tx_to_value(&outcome.tx, case)? }))
}

pub async fn handle_initiate(state: &RpcState, id: Value, params: Option<Value>) -> Value {
    let service = match swap_service(state, &id) {
        Ok(service) => service,
        Err(reply) => return reply,
    };
    let params = match cased_params(&id, params) {
        Ok(params) => params,
        Err(reply) => return reply,
    };
    let indices = match asset_indices(&params.rest) {
        Ok(indices) => indices,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    debug!(case = params.case.as_str(), inputs = params.tx.inputs.len(), indices = ?indices, "initiate request");

    match service.initiate(params.tx, &indices).await {
        Ok(outcome) => {
            info!(key = %outcome.key, ask_tokens = outcome.ask_tokens, bid_tokens = outcome.bid_tokens, "swap initiated");
            match initiate_result(&outcome, params.case) {
                Ok(result) => json_ok(id, result),
                Err(err) => json_err(id, RpcErrorCode::InternalError, err.to_string()),
            }
        }
        Err(err) => {
            debug!(code = ?err.code(), error = %err, "initiate rejected");
            swap_error(id, &err, params.case)
        }
    }
}

pub async fn handle_confirm(state: &RpcState, id: Value, params: Option<Value>) -> Value {
    let service = match swap_service(state, &id) {
        Ok(service) => service,
        Err(reply) => return reply,
    };
    let params = match cased_params(&id, params) {
        Ok(params) => params,
        Err(reply) => return reply,
    };
    debug!(case = params.case.as_str(), tx_hash = %params.tx.hash(), "confirm request");

    match service.confirm(params.tx).await {
        Ok(outcome) => {
            info!(tx_hash = %outcome.tx_hash, "swap confirmed");
            match confirm_result(&outcome, params.case) {
                Ok(result) => json_ok(id, result),
                Err(err) => json_err(id, RpcErrorCode::InternalError, err.to_string()),
            }
        }
        Err(err) => {
            debug!(code = ?err.code(), error = %err, "confirm rejected");
            swap_error(id, &err, params.case)
        }
    }
}
