use super::correlation::CorrelationId;
use crate::api::state::RpcState;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use log::{debug, error, trace, warn, Level};
use std::sync::Arc;
use std::time::Instant;

const REDACTED_HEADERS: &[&str] = &["authorization", "x-api-key", "cookie"];
const MAX_HEADER_VALUE_LEN: usize = 128;

fn sanitize_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "<redacted>".to_string()
            } else {
                match value.to_str() {
                    Ok(text) if text.len() > MAX_HEADER_VALUE_LEN => format!("{}...", &text[..MAX_HEADER_VALUE_LEN]),
                    Ok(text) => text.to_string(),
                    Err(_) => "<non-utf8>".to_string(),
                }
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

fn content_length(headers: &HeaderMap) -> u64 {
    headers.get(axum::http::header::CONTENT_LENGTH).and_then(|v| v.to_str().ok()).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// One line per request; probes log at trace, failures at warn/error.
pub async fn logging_middleware(State(state): State<Arc<RpcState>>, req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client_ip =
        req.extensions().get::<ConnectInfo<std::net::SocketAddr>>().map(|ConnectInfo(addr)| addr.ip().to_string()).unwrap_or_default();
    let correlation_id = req.extensions().get::<CorrelationId>().map(|id| id.0.clone()).unwrap_or_default();
    let request_body_size = content_length(req.headers());
    debug!(
        target: "http",
        "request headers correlation_id={} method={} path={} headers={:?}",
        correlation_id,
        method,
        path,
        sanitize_headers(req.headers())
    );
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let level = if path != state.rpc_path {
        Level::Trace
    } else if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Debug
    };
    let line = format!(
        "request correlation_id={} client_ip={} method={} path={} status={} duration_ms={} request_body_size={} response_body_size={}",
        correlation_id,
        client_ip,
        method,
        path,
        status.as_u16(),
        started.elapsed().as_millis(),
        request_body_size,
        content_length(response.headers())
    );
    match level {
        Level::Error => error!(target: "http", "{}", line),
        Level::Warn => warn!(target: "http", "{}", line),
        Level::Debug => debug!(target: "http", "{}", line),
        _ => trace!(target: "http", "{}", line),
    }
    response
}
