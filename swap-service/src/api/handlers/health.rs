use crate::api::middleware::auth::authorize_rpc;
use crate::api::state::RpcState;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, trace};
use std::sync::Arc;

pub async fn handle_health(State(state): State<Arc<RpcState>>) -> impl IntoResponse {
    trace!("health check: ok");
    Json(serde_json::json!({
        "status": "healthy",
        "mode": state.mode.as_str(),
    }))
}

pub async fn handle_ready(State(state): State<Arc<RpcState>>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize_rpc(&headers, state.rpc_token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }

    let storage_ok = match state.storage.as_ref() {
        Some(storage) => match storage.health_check() {
            Ok(()) => true,
            Err(err) => {
                debug!("ready check: storage unhealthy error={}", err);
                false
            }
        },
        None => true,
    };
    let status = if storage_ok { "ready" } else { "degraded" };
    trace!("ready check status={} storage_ok={}", status, storage_ok);
    let code = if storage_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(serde_json::json!({ "status": status, "storage_ok": storage_ok }))).into_response()
}

pub async fn handle_metrics(State(state): State<Arc<RpcState>>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize_rpc(&headers, state.rpc_token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }

    if let Some(storage) = state.storage.as_ref() {
        match storage.pool_snapshot() {
            Ok(snapshot) => state.metrics.set_pool_sizes(&snapshot),
            Err(err) => debug!("pool snapshot for metrics failed error={}", err),
        }
    }
    match state.metrics.encode() {
        Ok(body) => {
            let mut response = body.into_response();
            response.headers_mut().insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
            response
        }
        Err(err) => {
            debug!("metrics encode failed error={}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics_error: {}", err)).into_response()
        }
    }
}
