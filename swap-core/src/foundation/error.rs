use secp256k1::Error as SecpError;
use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    SelfTrade,
    InsufficientBid,
    InvalidAssetIndex,
    InsufficientAsset,
    TradeTooLarge,
    EmptyTransaction,
    ReservationInvalid,
    InvalidMultisigConfig,
    MissingPlaceholder,
    PriceUnavailable,
    PoolExhausted,
    CellDataMismatch,
    ThresholdNotMet,
    SignerEndpointFailed,
    InvalidSignature,
    SigningFailed,
    SigningTimeout,
    BroadcastFailed,
    NodeRpcError,
    StorageError,
    StorageLockTimeout,
    SchemaMismatch,
    SerializationError,
    EncodingError,
    CryptoError,
    ConfigError,
    QueueError,
    Message,
}

/// Coarse classes the RPC boundary maps to numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied something the service refuses to act on.
    InvalidInput,
    /// Service-side resource exhaustion or inconsistent local data.
    Server,
    /// The chain node or a remote signer failed.
    Upstream,
    /// Bounded wait for the signing worker expired.
    Timeout,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("input cell {out_point} is owned by the service and cannot be traded")]
    SelfTrade { out_point: String },

    #[error("Input ckbytes are enough for output ckbytes!")]
    InsufficientBid,

    #[error("invalid asset output index {index}: {reason}")]
    InvalidAssetIndex { index: usize, reason: String },

    #[error("insufficient asset balance: required {required}, available {available}")]
    InsufficientAsset { required: u128, available: u128 },

    #[error("trade of {bid} shannons exceeds the per-transaction maximum of {max}")]
    TradeTooLarge { bid: u64, max: u64 },

    #[error("transaction has no inputs")]
    EmptyTransaction,

    #[error("Locked cell is missing, invalid or expired!")]
    ReservationInvalid,

    #[error("invalid multisig config: {0}")]
    InvalidMultisigConfig(String),

    #[error("witness {index} does not carry the expected lock placeholder")]
    MissingPlaceholder { index: usize },

    #[error("no price is available for {udt}")]
    PriceUnavailable { udt: String },

    #[error("No live cell is available for converting!")]
    PoolExhausted,

    #[error("Server data mismatch! cell {out_point} is neither cached nor live")]
    CellDataMismatch { out_point: String },

    #[error("threshold not met: required {required}, received {received}")]
    ThresholdNotMet { required: u8, received: u8 },

    #[error("signer endpoint {endpoint} failed: {details}")]
    SignerEndpointFailed { endpoint: String, details: String },

    #[error("invalid signature from signer {signer_index}")]
    InvalidSignature { signer_index: usize },

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("timed out after {waited_ms}ms waiting for the signed transaction")]
    SigningTimeout { waited_ms: u64 },

    /// `signed_tx` is the node JSON form of the transaction that was refused.
    #[error("broadcast of {tx_hash} failed: {details}")]
    BroadcastFailed { tx_hash: String, details: String, signed_tx: Option<serde_json::Value> },

    #[error("node RPC error: {0}")]
    NodeRpcError(String),

    #[error("storage error during {operation}: {details}")]
    StorageError { operation: String, details: String },

    #[error("storage lock timeout: {operation} (waited {timeout_secs}s)")]
    StorageLockTimeout { operation: String, timeout_secs: u64 },

    #[error("schema mismatch: stored={stored} current={current}")]
    SchemaMismatch { stored: u32, current: u32 },

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("crypto error during {operation}: {details}")]
    CryptoError { operation: String, details: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("job queue error: {0}")]
    QueueError(String),

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, SwapError>;

impl SwapError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SwapError::InvalidInput(_) => ErrorCode::InvalidInput,
            SwapError::SelfTrade { .. } => ErrorCode::SelfTrade,
            SwapError::InsufficientBid => ErrorCode::InsufficientBid,
            SwapError::InvalidAssetIndex { .. } => ErrorCode::InvalidAssetIndex,
            SwapError::InsufficientAsset { .. } => ErrorCode::InsufficientAsset,
            SwapError::TradeTooLarge { .. } => ErrorCode::TradeTooLarge,
            SwapError::EmptyTransaction => ErrorCode::EmptyTransaction,
            SwapError::ReservationInvalid => ErrorCode::ReservationInvalid,
            SwapError::InvalidMultisigConfig(_) => ErrorCode::InvalidMultisigConfig,
            SwapError::MissingPlaceholder { .. } => ErrorCode::MissingPlaceholder,
            SwapError::PriceUnavailable { .. } => ErrorCode::PriceUnavailable,
            SwapError::PoolExhausted => ErrorCode::PoolExhausted,
            SwapError::CellDataMismatch { .. } => ErrorCode::CellDataMismatch,
            SwapError::ThresholdNotMet { .. } => ErrorCode::ThresholdNotMet,
            SwapError::SignerEndpointFailed { .. } => ErrorCode::SignerEndpointFailed,
            SwapError::InvalidSignature { .. } => ErrorCode::InvalidSignature,
            SwapError::SigningFailed(_) => ErrorCode::SigningFailed,
            SwapError::SigningTimeout { .. } => ErrorCode::SigningTimeout,
            SwapError::BroadcastFailed { .. } => ErrorCode::BroadcastFailed,
            SwapError::NodeRpcError(_) => ErrorCode::NodeRpcError,
            SwapError::StorageError { .. } => ErrorCode::StorageError,
            SwapError::StorageLockTimeout { .. } => ErrorCode::StorageLockTimeout,
            SwapError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            SwapError::SerializationError { .. } => ErrorCode::SerializationError,
            SwapError::EncodingError(_) => ErrorCode::EncodingError,
            SwapError::CryptoError { .. } => ErrorCode::CryptoError,
            SwapError::ConfigError(_) => ErrorCode::ConfigError,
            SwapError::QueueError(_) => ErrorCode::QueueError,
            SwapError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SwapError::InvalidInput(_)
            | SwapError::SelfTrade { .. }
            | SwapError::InsufficientBid
            | SwapError::InvalidAssetIndex { .. }
            | SwapError::InsufficientAsset { .. }
            | SwapError::TradeTooLarge { .. }
            | SwapError::EmptyTransaction
            | SwapError::ReservationInvalid
            | SwapError::InvalidMultisigConfig(_)
            | SwapError::MissingPlaceholder { .. }
            | SwapError::EncodingError(_) => ErrorCategory::InvalidInput,
            SwapError::ThresholdNotMet { .. }
            | SwapError::SignerEndpointFailed { .. }
            | SwapError::InvalidSignature { .. }
            | SwapError::BroadcastFailed { .. }
            | SwapError::NodeRpcError(_) => ErrorCategory::Upstream,
            SwapError::SigningTimeout { .. } => ErrorCategory::Timeout,
            _ => ErrorCategory::Server,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        SwapError::InvalidInput(message.into())
    }

    pub fn node_rpc(details: impl std::fmt::Display) -> Self {
        SwapError::NodeRpcError(details.to_string())
    }
}

impl From<hex::FromHexError> for SwapError {
    fn from(err: hex::FromHexError) -> Self {
        SwapError::EncodingError(format!("hex decode error: {}", err))
    }
}

impl From<rocksdb::Error> for SwapError {
    fn from(err: rocksdb::Error) -> Self {
        SwapError::StorageError { operation: "rocksdb".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for SwapError {
    fn from(err: bincode::Error) -> Self {
        SwapError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

#[macro_export]
macro_rules! storage_err {
    ($op:expr, $err:expr) => {
        $crate::foundation::SwapError::StorageError { operation: $op.into(), details: $err.to_string() }
    };
}

#[macro_export]
macro_rules! serde_err {
    ($fmt:expr, $err:expr) => {
        $crate::foundation::SwapError::SerializationError { format: $fmt.into(), details: $err.to_string() }
    };
}

impl From<io::Error> for SwapError {
    fn from(err: io::Error) -> Self {
        SwapError::StorageError { operation: "io".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        SwapError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        SwapError::NodeRpcError(err.to_string())
    }
}

impl From<SecpError> for SwapError {
    fn from(err: SecpError) -> Self {
        SwapError::CryptoError { operation: "secp256k1".to_string(), details: err.to_string() }
    }
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `SwapError` variants at the call site to preserve context.
