use crate::service::metrics::Metrics;
use crate::service::ServiceMode;
use std::sync::Arc;
use swap_core::application::{EndpointSigner, SwapService};
use swap_core::infrastructure::storage::SwapStorage;

#[derive(Clone)]
pub struct RpcState {
    pub mode: ServiceMode,
    /// Serves `initiate`/`confirm`; set in `all` mode.
    pub swap: Option<Arc<SwapService>>,
    /// Serves `sign`; set in `multisig-signer` mode.
    pub signer: Option<Arc<EndpointSigner>>,
    /// Checked by `/ready`; a signer without local storage reports ready on its own.
    pub storage: Option<Arc<dyn SwapStorage>>,
    pub rpc_token: Option<String>,
    pub rpc_path: String,
    pub log_request: bool,
    pub max_body_bytes: usize,
    pub metrics: Arc<Metrics>,
}
