use super::{TxSigner, FUND_POOL_GROUP_MISSING};
use crate::domain::ledger::sighash::{lock_group, sighash_all_message, write_witness_lock};
use crate::domain::ledger::signature::sign_recoverable;
use crate::domain::ledger::{Script, Transaction};
use crate::foundation::{Result, SwapError, SIGNATURE_SIZE};
use crate::infrastructure::chain::{resolve_inputs, ChainClient};
use async_trait::async_trait;
use log::debug;
use secp256k1::SecretKey;
use std::sync::Arc;

/// Signs the sighash-all message of the inputs locked by `lock`.
///
/// Returns the index of the group's first input, where the signature belongs, and the signature.
pub async fn sign_lock_group(
    chain: &dyn ChainClient,
    secret: &SecretKey,
    lock: &Script,
    tx: &Transaction,
) -> Result<(usize, [u8; SIGNATURE_SIZE])> {
    let resolved = resolve_inputs(chain, tx).await?;
    let outputs = resolved.into_iter().map(|cell| cell.output).collect::<Vec<_>>();
    let group = lock_group(&outputs, lock);
    let first = *group.first().ok_or_else(|| SwapError::invalid_input(FUND_POOL_GROUP_MISSING))?;
    let message = sighash_all_message(tx, &group)?;
    debug!("signing lock group first_input={} inputs={} message={}", first, group.len(), hex::encode(message));
    Ok((first, sign_recoverable(secret, &message)))
}

/// Fund pool signer for cells under a secp256k1/blake160 lock.
pub struct SingleKeySigner {
    secret: SecretKey,
    lock: Script,
    chain: Arc<dyn ChainClient>,
}

impl SingleKeySigner {
    pub fn new(secret: SecretKey, lock: Script, chain: Arc<dyn ChainClient>) -> Self {
        Self { secret, lock, chain }
    }

    pub fn lock(&self) -> &Script {
        &self.lock
    }
}

#[async_trait]
impl TxSigner for SingleKeySigner {
    async fn sign(&self, mut tx: Transaction) -> Result<Transaction> {
        let (first, signature) = sign_lock_group(self.chain.as_ref(), &self.secret, &self.lock, &tx).await?;
        write_witness_lock(&mut tx, first, signature.to_vec())?;
        Ok(tx)
    }
}
