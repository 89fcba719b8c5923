//! JSON-RPC transport: one POST endpoint plus health, readiness and metrics.

pub mod case;
mod handlers;
mod middleware;
mod router;
mod state;

pub use handlers::types::{RpcErrorCode, ERROR_CODE_INVALID_INPUT, ERROR_CODE_SERVER, ERROR_CODE_TIMEOUT, ERROR_CODE_UPSTREAM};
pub use router::{build_router, run_json_rpc_server};
pub use state::RpcState;
