//! Collects r-of-m signatures from the multisig endpoints, and answers `sign` on an endpoint.

use crate::application::funding::FundPool;
use crate::domain::ledger::sighash::{lock_group, sighash_all_message, write_witness_lock};
use crate::domain::ledger::signature::{secret_key_hash, verify_pubkey_hash};
use crate::domain::ledger::{Script, Transaction};
use crate::domain::multisig::{fill_signatures, witness_lock_placeholder, MultisigConfig};
use crate::foundation::{Hash32, Result, SwapError, BLAKE160_SIZE, SIGNATURE_SIZE};
use crate::infrastructure::chain::{resolve_inputs, ChainClient};
use crate::infrastructure::signing::{sign_lock_group, RemoteSigner, TxSigner, FUND_POOL_GROUP_MISSING};
use async_trait::async_trait;
use futures_util::future::{try_join, try_join_all};
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use secp256k1::SecretKey;
use std::sync::Arc;

type IndexedSignature = (usize, [u8; SIGNATURE_SIZE]);

pub struct MultisigCoordinator {
    config: MultisigConfig,
    lock: Script,
    chain: Arc<dyn ChainClient>,
    remote: Arc<dyn RemoteSigner>,
}

impl MultisigCoordinator {
    pub fn new(config: MultisigConfig, lock: Script, chain: Arc<dyn ChainClient>, remote: Arc<dyn RemoteSigner>) -> Self {
        Self { config, lock, chain, remote }
    }

    pub fn from_fund_pool(fund_pool: &FundPool, chain: Arc<dyn ChainClient>, remote: Arc<dyn RemoteSigner>) -> Result<Self> {
        let config = fund_pool
            .multisig
            .clone()
            .ok_or_else(|| SwapError::ConfigError("fund pool is not a multisig pool".to_string()))?;
        Ok(Self::new(config, fund_pool.lock.clone(), chain, remote))
    }

    pub fn config(&self) -> &MultisigConfig {
        &self.config
    }

    /// Gathers `m` signatures over the multisig lock group and writes them into its first witness.
    ///
    /// Required endpoints (the first `r`) and optional ones are asked at the same time. Every required
    /// endpoint must answer with a valid signature; the slowest optional ones are dropped once `m`
    /// signatures are in hand.
    pub async fn sign_multisig_tx(&self, mut tx: Transaction) -> Result<Transaction> {
        let resolved = resolve_inputs(self.chain.as_ref(), &tx).await?;
        let outputs = resolved.into_iter().map(|cell| cell.output).collect::<Vec<_>>();
        let group = lock_group(&outputs, &self.lock);
        let first = *group.first().ok_or_else(|| SwapError::invalid_input(FUND_POOL_GROUP_MISSING))?;

        let placeholder = witness_lock_placeholder(&self.config);
        let lock = tx.witness_args(first)?.and_then(|args| args.lock);
        if lock.as_deref() != Some(placeholder.as_slice()) {
            return Err(SwapError::MissingPlaceholder { index: first });
        }
        let message = sighash_all_message(&tx, &group)?;

        let required = usize::from(self.config.required());
        let threshold = usize::from(self.config.threshold());
        let wanted_optional = threshold.saturating_sub(required);
        let required_signatures = try_join_all((0..required).map(|index| self.fetch_signature(index, &tx, &message)));
        let optional_signatures = async {
            let mut pending = (required..self.config.signer_count())
                .map(|index| self.fetch_signature(index, &tx, &message))
                .collect::<FuturesUnordered<_>>();
            let mut gathered = Vec::with_capacity(wanted_optional);
            while gathered.len() < wanted_optional {
                match pending.next().await {
                    Some(Ok(signature)) => gathered.push(signature),
                    Some(Err(err)) => warn!("optional signer failed tx_hash={} error={}", tx.hash(), err),
                    None => break,
                }
            }
            Ok::<_, SwapError>(gathered)
        };
        let (mut collected, optional) = try_join(required_signatures, optional_signatures).await?;
        debug!("signatures collected required={} optional={} tx_hash={}", collected.len(), optional.len(), tx.hash());
        collected.extend(optional);

        if collected.len() < threshold {
            return Err(SwapError::ThresholdNotMet { required: self.config.threshold(), received: collected.len() as u8 });
        }
        // Slots follow signer position, the order the multisig lock script checks them in.
        collected.sort_by_key(|(index, _)| *index);
        let signatures = collected.into_iter().map(|(_, signature)| signature).collect::<Vec<_>>();
        write_witness_lock(&mut tx, first, fill_signatures(&self.config, &placeholder, &signatures)?)?;
        info!("multisig transaction signed tx_hash={} signatures={}", tx.hash(), signatures.len());
        Ok(tx)
    }

    async fn fetch_signature(&self, index: usize, tx: &Transaction, message: &Hash32) -> Result<IndexedSignature> {
        let endpoint = self
            .config
            .endpoints()
            .get(index)
            .ok_or_else(|| SwapError::InvalidMultisigConfig(format!("no endpoint for signer {index}")))?;
        let raw = self.remote.request_signature(endpoint, tx).await?;
        let signature: [u8; SIGNATURE_SIZE] = raw.as_slice().try_into().map_err(|_| SwapError::InvalidSignature { signer_index: index })?;
        let expected = self.config.pubkey_hashes().get(index).ok_or(SwapError::InvalidSignature { signer_index: index })?;
        if !verify_pubkey_hash(&signature, message, expected) {
            return Err(SwapError::InvalidSignature { signer_index: index });
        }
        Ok((index, signature))
    }
}

#[async_trait]
impl TxSigner for MultisigCoordinator {
    async fn sign(&self, tx: Transaction) -> Result<Transaction> {
        self.sign_multisig_tx(tx).await
    }
}

/// Local half of the multisig: signs the fund pool group for whoever calls `sign`.
///
/// Never touches the reservation pools.
pub struct EndpointSigner {
    secret: SecretKey,
    lock: Script,
    chain: Arc<dyn ChainClient>,
}

impl EndpointSigner {
    /// Fails unless the key belongs to one of the configured signers.
    pub fn new(secret: SecretKey, fund_pool: &FundPool, chain: Arc<dyn ChainClient>) -> Result<Self> {
        let config = fund_pool
            .multisig
            .as_ref()
            .ok_or_else(|| SwapError::ConfigError("multisig-signer mode needs a multisig fund pool".to_string()))?;
        let hash = secret_key_hash(&secret);
        if !config.pubkey_hashes().contains(&hash) {
            return Err(SwapError::ConfigError(format!("key 0x{} is not a configured multisig signer", hex::encode(hash))));
        }
        Ok(Self { secret, lock: fund_pool.lock.clone(), chain })
    }

    pub fn pubkey_hash(&self) -> [u8; BLAKE160_SIZE] {
        secret_key_hash(&self.secret)
    }

    pub async fn sign(&self, tx: &Transaction) -> Result<[u8; SIGNATURE_SIZE]> {
        let (_, signature) = sign_lock_group(self.chain.as_ref(), &self.secret, &self.lock, tx).await?;
        Ok(signature)
    }
}
