use super::sign::handle_sign;
use super::swap::{handle_confirm, handle_initiate};
use super::types::{json_err, JsonRpcRequest, RpcErrorCode};
use crate::api::middleware::auth::authorize_rpc;
use crate::api::middleware::correlation::REQUEST_ID_HEADER;
use crate::api::state::RpcState;
use crate::service::ServiceMode;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub async fn handle_rpc(State(state): State<Arc<RpcState>>, headers: HeaderMap, body: String) -> Response {
    let started = Instant::now();
    if state.log_request {
        info!(body = %body, "rpc request body");
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) else {
        debug!(body_len = body.len(), "rpc parse error");
        return axum::Json(json_err(serde_json::Value::Null, RpcErrorCode::ParseError, "parse error")).into_response();
    };

    let reply = match value {
        serde_json::Value::Array(batch) if batch.is_empty() => {
            json_err(serde_json::Value::Null, RpcErrorCode::InvalidRequest, "empty batch")
        }
        serde_json::Value::Array(batch) => {
            debug!(batch_size = batch.len(), "rpc batch request");
            let mut out = Vec::with_capacity(batch.len());
            for item in batch {
                out.push(handle_value(&state, &headers, item).await);
            }
            serde_json::Value::Array(out)
        }
        other => handle_value(&state, &headers, other).await,
    };

    if state.log_request {
        info!(body = %reply, "rpc response body");
    }
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "rpc handled");
    axum::Json(reply).into_response()
}

async fn handle_value(state: &RpcState, headers: &HeaderMap, value: serde_json::Value) -> serde_json::Value {
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(req) => handle_single(state, headers, req).await,
        Err(err) => json_err(serde_json::Value::Null, RpcErrorCode::InvalidRequest, err.to_string()),
    }
}

fn metric_method(mode: ServiceMode, method: &str) -> &'static str {
    match (mode, method) {
        (ServiceMode::All, "initiate") => "initiate",
        (ServiceMode::All, "confirm") => "confirm",
        (ServiceMode::MultisigSigner, "sign") => "sign",
        _ => "unknown",
    }
}

async fn handle_single(state: &RpcState, headers: &HeaderMap, req: JsonRpcRequest) -> serde_json::Value {
    let id = req.id.clone();
    let correlation_id = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("");
    let method = metric_method(state.mode, &req.method);
    let span = tracing::info_span!("rpc_request", correlation_id = %correlation_id, method = %req.method, has_id = !id.is_null());
    let _entered = span.enter();
    debug!("rpc request");

    if let Some(version) = req.jsonrpc.as_deref() {
        if version != "2.0" {
            state.metrics.inc_rpc_request(method, "invalid_request");
            debug!(method = %req.method, "rpc invalid jsonrpc version");
            return json_err(id, RpcErrorCode::InvalidRequest, "jsonrpc must be '2.0'");
        }
    }

    if let Err(err) = authorize_rpc(headers, state.rpc_token.as_deref()) {
        state.metrics.inc_rpc_request(method, "unauthorized");
        warn!("rpc unauthorized");
        return json_err(id, RpcErrorCode::Unauthorized, err);
    }

    let reply = match method {
        "initiate" => handle_initiate(state, id, req.params).await,
        "confirm" => handle_confirm(state, id, req.params).await,
        "sign" => handle_sign(state, id, req.params).await,
        _ => {
            state.metrics.inc_rpc_request(method, "not_found");
            debug!(method = %req.method, mode = state.mode.as_str(), "rpc method not found");
            return json_err(id, RpcErrorCode::MethodNotFound, "method not found");
        }
    };
    match reply.get("error").and_then(|error| error.get("code")) {
        Some(code) => {
            state.metrics.inc_rpc_request(method, "error");
            debug!(error_code = %code, "rpc request failed");
        }
        None => state.metrics.inc_rpc_request(method, "ok"),
    }
    reply
}
