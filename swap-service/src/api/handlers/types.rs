use crate::api::case::{to_case, Case};
use serde::{Deserialize, Serialize};
use swap_core::foundation::{ErrorCategory, SwapError};

pub const ERROR_CODE_INVALID_INPUT: i64 = 2001;
pub const ERROR_CODE_SERVER: i64 = 2002;
pub const ERROR_CODE_UPSTREAM: i64 = 2003;
pub const ERROR_CODE_TIMEOUT: i64 = 2004;

#[repr(i64)]
#[derive(Clone, Copy, Debug)]
pub enum RpcErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    Unauthorized = -32001,
    InvalidInput = ERROR_CODE_INVALID_INPUT,
    Server = ERROR_CODE_SERVER,
    Upstream = ERROR_CODE_UPSTREAM,
    Timeout = ERROR_CODE_TIMEOUT,
}

impl RpcErrorCode {
    pub fn for_error(err: &SwapError) -> Self {
        match err.category() {
            ErrorCategory::InvalidInput => RpcErrorCode::InvalidInput,
            ErrorCategory::Server => RpcErrorCode::Server,
            ErrorCategory::Upstream => RpcErrorCode::Upstream,
            ErrorCategory::Timeout => RpcErrorCode::Timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: serde_json::Value,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    pub error: JsonRpcErrorBody,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

pub fn json_ok<T: Serialize>(id: serde_json::Value, result: T) -> serde_json::Value {
    serde_json::to_value(JsonRpcResponse { jsonrpc: "2.0", id, result }).unwrap_or(serde_json::Value::Null)
}

pub fn json_err(id: serde_json::Value, code: RpcErrorCode, message: impl Into<String>) -> serde_json::Value {
    json_err_with_data(id, code, message, None)
}

pub fn json_err_with_data(
    id: serde_json::Value,
    code: RpcErrorCode,
    message: impl Into<String>,
    data: Option<serde_json::Value>,
) -> serde_json::Value {
    serde_json::to_value(JsonRpcError { jsonrpc: "2.0", id, error: JsonRpcErrorBody { code: code as i64, message: message.into(), data } })
        .unwrap_or(serde_json::Value::Null)
}

/// Error response for a failed swap call; a refused broadcast carries the signed transaction as `data`.
pub fn swap_error(id: serde_json::Value, err: &SwapError, case: Case) -> serde_json::Value {
    let data = match err {
        SwapError::BroadcastFailed { signed_tx: Some(tx), .. } => Some(to_case(tx.clone(), case)),
        _ => None,
    };
    json_err_with_data(id, RpcErrorCode::for_error(err), err.to_string(), data)
}
