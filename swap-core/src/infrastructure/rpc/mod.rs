//! JSON-RPC over HTTP plumbing shared by the node client and the remote signer client.

pub mod client;
pub mod retry;

pub use client::{JsonRpcClient, RpcFailure};
pub use retry::{poll_with_backoff, retry, BackoffPolicy};
