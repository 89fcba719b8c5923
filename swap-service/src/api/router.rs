use super::handlers::health::{handle_health, handle_metrics, handle_ready};
use super::handlers::rpc::handle_rpc;
use super::middleware::correlation::correlation_middleware;
use super::middleware::logging::logging_middleware;
use super::state::RpcState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use swap_core::foundation::SwapError;
use tokio::net::TcpListener;

/// Serves until the listener fails; returning at all is an error for the supervisor.
pub async fn run_json_rpc_server(addr: SocketAddr, state: Arc<RpcState>) -> Result<(), SwapError> {
    info!("binding json-rpc server addr={} path={} mode={}", addr, state.rpc_path, state.mode.as_str());
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server ready and accepting connections addr={}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.map_err(|err| {
        error!("HTTP server terminated unexpectedly addr={} error={}", addr, err);
        SwapError::Message(err.to_string())
    })?;
    Err(SwapError::Message(format!("json-rpc server on {addr} stopped")))
}

pub fn build_router(state: Arc<RpcState>) -> Router {
    Router::new()
        .route(&state.rpc_path, post(handle_rpc))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(axum::middleware::from_fn_with_state(state.clone(), logging_middleware))
        .layer(axum::middleware::from_fn(correlation_middleware))
        .with_state(state)
}
