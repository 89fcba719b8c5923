use crate::domain::ledger::hash::CkbHasher;
use crate::domain::ledger::molecule;
use crate::domain::ledger::types::{CellOutput, Script, Transaction, WitnessArgs};
use crate::foundation::{Hash32, Result, SwapError};

/// Indices of the inputs whose resolved cell is locked by `lock`.
pub fn lock_group(resolved_inputs: &[CellOutput], lock: &Script) -> Vec<usize> {
    resolved_inputs.iter().enumerate().filter(|(_, output)| &output.lock == lock).map(|(index, _)| index).collect()
}

fn hash_witness(hasher: &mut CkbHasher, witness: &[u8]) {
    hasher.update(&(witness.len() as u64).to_le_bytes());
    hasher.update(witness);
}

/// Signing message for a lock group under the sighash-all scheme.
///
/// The first witness of the group must be a `WitnessArgs` whose lock carries the zero-able
/// placeholder; it is hashed with the lock zeroed, followed by the rest of the group's witnesses
/// and every witness past the input count.
pub fn sighash_all_message(tx: &Transaction, group: &[usize]) -> Result<Hash32> {
    let first = *group.first().ok_or_else(|| SwapError::SigningFailed("empty lock group".to_string()))?;
    let args = tx.witness_args(first)?.ok_or(SwapError::MissingPlaceholder { index: first })?;
    let lock = args.lock.as_ref().ok_or(SwapError::MissingPlaceholder { index: first })?;
    let zeroed = molecule::witness_args(&WitnessArgs { lock: Some(vec![0u8; lock.len()]), ..args.clone() });

    let mut hasher = CkbHasher::new();
    hasher.update(tx.hash().as_ref());
    hash_witness(&mut hasher, &zeroed);
    for index in group.iter().skip(1) {
        hash_witness(&mut hasher, tx.witnesses.get(*index).map(Vec::as_slice).unwrap_or_default());
    }
    for witness in tx.witnesses.iter().skip(tx.inputs.len()) {
        hash_witness(&mut hasher, witness);
    }
    Ok(hasher.finalize())
}

/// Replaces the lock bytes of the group's first witness, keeping its type fields.
pub fn write_witness_lock(tx: &mut Transaction, index: usize, lock: Vec<u8>) -> Result<()> {
    let mut args = tx.witness_args(index)?.unwrap_or_default();
    args.lock = Some(lock);
    tx.set_witness_args(index, &args);
    Ok(())
}
