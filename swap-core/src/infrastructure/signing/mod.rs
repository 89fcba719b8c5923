//! Transaction signers used by the signing worker, and the transport to remote multisig endpoints.

pub mod remote;
pub mod single;

pub use remote::{HttpRemoteSigner, RemoteSigner, SignResponse};
pub use single::{sign_lock_group, SingleKeySigner};

use crate::domain::ledger::Transaction;
use crate::foundation::Result;
use async_trait::async_trait;

/// Produces a fully signed transaction for the funding inputs of `tx`.
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn sign(&self, tx: Transaction) -> Result<Transaction>;
}

pub(crate) const FUND_POOL_GROUP_MISSING: &str = "Cannot find fund pool script to sign!";
