use crate::domain::ledger::json::{JsonBytes, JsonTransaction};
use crate::domain::ledger::Transaction;
use crate::foundation::{Result, SwapError};
use crate::infrastructure::rpc::JsonRpcClient;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Result of the `sign` JSON-RPC method served by a multisig endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub signature: JsonBytes,
}

/// Asks one multisig endpoint for its signature over the fund pool group of `tx`.
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn request_signature(&self, endpoint: &str, tx: &Transaction) -> Result<Vec<u8>>;
}

/// JSON-RPC transport to the multisig endpoints; calls `sign` with `[tx, "snake"]`.
pub struct HttpRemoteSigner {
    clients: HashMap<String, JsonRpcClient>,
}

impl HttpRemoteSigner {
    pub fn new(endpoints: &[String], token: Option<String>, timeout: Duration) -> Result<Self> {
        let mut clients = HashMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let client = JsonRpcClient::with_timeout(endpoint.clone(), timeout)?.with_token(token.clone());
            clients.insert(endpoint.clone(), client);
        }
        Ok(Self { clients })
    }
}

#[async_trait]
impl RemoteSigner for HttpRemoteSigner {
    async fn request_signature(&self, endpoint: &str, tx: &Transaction) -> Result<Vec<u8>> {
        let client = self.clients.get(endpoint).ok_or_else(|| SwapError::SignerEndpointFailed {
            endpoint: endpoint.to_string(),
            details: "endpoint is not configured".to_string(),
        })?;
        debug!("requesting signature endpoint={} tx_hash={}", endpoint, tx.hash());
        let response: SignResponse = client
            .call("sign", (JsonTransaction::from(tx), "snake"))
            .await
            .map_err(|err| SwapError::SignerEndpointFailed { endpoint: endpoint.to_string(), details: err.to_string() })?;
        Ok(response.signature.0)
    }
}
