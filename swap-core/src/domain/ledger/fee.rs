use crate::domain::ledger::types::Transaction;
use crate::foundation::{MIN_FEE_RATE, TX_SIZE_IN_BLOCK_OVERHEAD};

/// Size the node charges for: the serialized transaction plus its slot in the block.
pub fn size_in_block(tx: &Transaction) -> usize {
    tx.serialized_size() + TX_SIZE_IN_BLOCK_OVERHEAD
}

/// Fee in shannons for `tx` at `fee_rate` shannons per 1000 bytes, rounded up.
pub fn estimate_fee(tx: &Transaction, fee_rate: u64) -> u64 {
    let size = size_in_block(tx) as u64;
    size.saturating_mul(fee_rate).saturating_add(999) / 1000
}

/// Applies the node's floor to a fee rate reported by statistics.
pub fn effective_fee_rate(median: Option<u64>) -> u64 {
    median.unwrap_or(MIN_FEE_RATE).max(MIN_FEE_RATE)
}
