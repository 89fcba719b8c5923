use crate::foundation::SwapError;
use log::{debug, trace};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct JsonRpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Clone)]
pub enum RpcFailure {
    Transport(String),
    Http { status: StatusCode, body: String },
    InvalidJson { error: String, body: String },
    JsonRpc { code: i64, message: String, data: Option<Value> },
}

impl fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcFailure::Transport(message) => write!(f, "transport_error={message}"),
            RpcFailure::Http { status, body } => write!(f, "http_status={status} body={body}"),
            RpcFailure::InvalidJson { error, body } => write!(f, "invalid_json_error={error} body={body}"),
            RpcFailure::JsonRpc { code, message, .. } => write!(f, "json_rpc_error code={code} message={message}"),
        }
    }
}

/// Minimal JSON-RPC 2.0 client over one HTTP endpoint.
pub struct JsonRpcClient {
    http: Client,
    url: String,
    token: Option<String>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, SwapError> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, SwapError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SwapError::ConfigError(format!("http client build failed: {err}")))?;
        Ok(Self { http, url: url.into(), token: None, next_id: AtomicU64::new(1) })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Calls `method`; a JSON `null` result deserializes into `R` as-is (use `Option<_>`).
    pub async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!("json-rpc request method={} id={}", method, id);

        let mut req = self.http.post(&self.url).json(&payload);
        if let Some(token) = self.token.as_deref() {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let resp = req.send().await.map_err(|err| RpcFailure::Transport(err.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|err| RpcFailure::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(RpcFailure::Http { status, body });
        }
        let envelope: JsonRpcEnvelope =
            serde_json::from_str(&body).map_err(|err| RpcFailure::InvalidJson { error: err.to_string(), body: body.clone() })?;
        if let Some(err) = envelope.error {
            debug!("json-rpc error method={} code={} message={}", method, err.code, err.message);
            return Err(RpcFailure::JsonRpc { code: err.code, message: err.message, data: err.data });
        }
        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|err| RpcFailure::InvalidJson { error: err.to_string(), body })
    }
}
