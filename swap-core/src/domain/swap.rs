//! Swap records and the pure transaction checks used by `initiate` and `confirm`.

use crate::domain::ledger::udt::{checked_sum, set_udt_amount, udt_amount};
use crate::domain::ledger::{OutPoint, Script, Transaction};
use crate::foundation::{Result, SwapError, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle of one swap, keyed by the outpoint of its last reserved cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapPhase {
    Initiated,
    Confirming,
    Committed,
    Cancelled,
}

impl SwapPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapPhase::Initiated => "initiated",
            SwapPhase::Confirming => "confirming",
            SwapPhase::Committed => "committed",
            SwapPhase::Cancelled => "cancelled",
        }
    }
}

/// Unsigned transaction produced by `initiate`, waiting for `confirm`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTransaction {
    pub tx: Transaction,
    /// Service cells spent by `tx`, in input order.
    pub reserved_cells: Vec<OutPoint>,
    pub valid_until: u64,
}

impl SavedTransaction {
    /// Key under which the record is stored: the last reserved cell, which is also the last input.
    pub fn key(&self) -> Option<OutPoint> {
        self.reserved_cells.last().copied()
    }
}

/// Signed transaction handed to the node and not yet seen committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBroadcast {
    pub tx_hash: TxHash,
    pub tx: Transaction,
    pub committed_cells: Vec<OutPoint>,
    pub submitted_at: u64,
}

pub fn reservation_key(tx: &Transaction) -> Option<OutPoint> {
    tx.inputs.last().map(|input| input.previous_output)
}

/// Checks a transaction returned by the caller against the one handed out by `initiate`.
///
/// Content hash and witness count must match. Witnesses of service inputs must be byte
/// identical; the caller may only have replaced its own witnesses, keeping their lengths.
pub fn matches_saved(submitted: &Transaction, saved: &SavedTransaction) -> bool {
    if submitted.hash() != saved.tx.hash() || submitted.witnesses.len() != saved.tx.witnesses.len() {
        return false;
    }
    let reserved: HashSet<&OutPoint> = saved.reserved_cells.iter().collect();
    submitted.witnesses.iter().zip(saved.tx.witnesses.iter()).enumerate().all(|(index, (ours, theirs))| {
        let service_owned = saved.tx.inputs.get(index).is_some_and(|input| reserved.contains(&input.previous_output));
        if service_owned {
            ours == theirs
        } else {
            ours.len() == theirs.len()
        }
    })
}

/// Sums the asset held by the caller's designated outputs, checking each carries `udt_script`.
pub fn asset_balance(tx: &Transaction, indices: &[usize], udt_script: &Script) -> Result<u128> {
    let mut seen = HashSet::new();
    let mut amounts = Vec::with_capacity(indices.len());
    for index in indices {
        let output = tx
            .outputs
            .get(*index)
            .ok_or_else(|| SwapError::InvalidAssetIndex { index: *index, reason: format!("only {} outputs", tx.outputs.len()) })?;
        if output.type_.as_ref() != Some(udt_script) {
            return Err(SwapError::InvalidAssetIndex { index: *index, reason: "output does not hold the configured asset".to_string() });
        }
        if !seen.insert(*index) {
            return Err(SwapError::InvalidAssetIndex { index: *index, reason: "index listed twice".to_string() });
        }
        amounts.push(tx.outputs_data.get(*index).map(|data| udt_amount(data)).unwrap_or(0));
    }
    checked_sum(amounts)
}

/// Removes `amount` asset units from the designated outputs, draining them in order.
pub fn debit_asset(tx: &mut Transaction, indices: &[usize], amount: u128) -> Result<()> {
    let mut remaining = amount;
    let mut available = 0u128;
    for index in indices {
        if remaining == 0 {
            break;
        }
        let data = tx.outputs_data.get_mut(*index).ok_or_else(|| SwapError::InvalidAssetIndex {
            index: *index,
            reason: "output has no data entry".to_string(),
        })?;
        let held = udt_amount(data);
        available = available.saturating_add(held);
        let taken = held.min(remaining);
        set_udt_amount(data, held - taken);
        remaining -= taken;
    }
    if remaining > 0 {
        return Err(SwapError::InsufficientAsset { required: amount, available });
    }
    Ok(())
}
