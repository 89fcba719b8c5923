use crate::domain::ledger::hash::ckbhash;
use crate::domain::multisig::config::MultisigConfig;
use crate::foundation::{Result, SwapError, BLAKE160_SIZE, MULTISIG_VERSION, SIGNATURE_SIZE};

const HEADER_SIZE: usize = 4;

/// `[version, r, m, n]` followed by the `n` pubkey hashes.
///
/// This structure is hashed into the lock args; it is not itself a chain script.
pub fn multisig_script(config: &MultisigConfig) -> Vec<u8> {
    let hashes = config.pubkey_hashes();
    let mut out = Vec::with_capacity(HEADER_SIZE + hashes.len() * BLAKE160_SIZE);
    out.extend_from_slice(&[MULTISIG_VERSION, config.required(), config.threshold(), hashes.len() as u8]);
    for hash in hashes {
        out.extend_from_slice(hash);
    }
    out
}

/// Lock args: the leading 20 bytes of ckbhash over the structure.
pub fn multisig_args(config: &MultisigConfig) -> [u8; BLAKE160_SIZE] {
    let mut out = [0u8; BLAKE160_SIZE];
    out.copy_from_slice(&ckbhash(&multisig_script(config))[..BLAKE160_SIZE]);
    out
}

/// Structure followed by `m` zeroed signature slots.
pub fn witness_lock_placeholder(config: &MultisigConfig) -> Vec<u8> {
    let mut out = multisig_script(config);
    out.resize(out.len() + usize::from(config.threshold()) * SIGNATURE_SIZE, 0);
    out
}

/// Writes signatures into consecutive slots after the structure.
pub fn fill_signatures(config: &MultisigConfig, placeholder: &[u8], signatures: &[[u8; SIGNATURE_SIZE]]) -> Result<Vec<u8>> {
    let script_len = multisig_script(config).len();
    let expected = script_len + usize::from(config.threshold()) * SIGNATURE_SIZE;
    if placeholder.len() != expected {
        return Err(SwapError::SigningFailed(format!("placeholder length {} does not match expected {}", placeholder.len(), expected)));
    }
    if signatures.len() > usize::from(config.threshold()) {
        return Err(SwapError::SigningFailed(format!("{} signatures exceed threshold {}", signatures.len(), config.threshold())));
    }
    let mut out = placeholder.to_vec();
    for (slot, signature) in signatures.iter().enumerate() {
        let start = script_len + slot * SIGNATURE_SIZE;
        out[start..start + SIGNATURE_SIZE].copy_from_slice(signature);
    }
    Ok(out)
}
