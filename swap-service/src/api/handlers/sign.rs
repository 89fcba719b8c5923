use super::types::{json_err, json_ok, swap_error, RpcErrorCode};
use crate::api::case::{parse_params, to_case};
use crate::api::state::RpcState;
use serde_json::{json, Value};
use swap_core::foundation::util::encoding::encode_hex_prefixed;
use tracing::{debug, warn};

/// Signs the fund pool group of the transaction with this endpoint's key. Never touches the pools.
pub async fn handle_sign(state: &RpcState, id: Value, params: Option<Value>) -> Value {
    let Some(signer) = state.signer.as_deref() else {
        return json_err(id, RpcErrorCode::MethodNotFound, "method not found");
    };
    let params = match parse_params(params) {
        Ok(params) => params,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let tx_hash = params.tx.hash();
    match signer.sign(&params.tx).await {
        Ok(signature) => {
            debug!(tx_hash = %tx_hash, "sign request served");
            json_ok(id, to_case(json!({ "signature": encode_hex_prefixed(&signature) }), params.case))
        }
        Err(err) => {
            warn!(tx_hash = %tx_hash, error = %err, "sign request failed");
            swap_error(id, &err, params.case)
        }
    }
}
