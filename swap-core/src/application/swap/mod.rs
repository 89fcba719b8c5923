//! The two public swap operations and the rollback paths they share.

mod confirm;
mod initiate;

use crate::application::context::SwapContext;
use crate::domain::ledger::{OutPoint, Transaction};
use crate::foundation::{TxHash, UdtName};
use log::warn;

/// Unsigned trade handed back by `initiate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitiateOutcome {
    /// Outpoint of the last reserved cell; `confirm` finds the trade by it.
    pub key: OutPoint,
    /// Unix seconds until which the reservation holds.
    pub valid_until: u64,
    pub tx: Transaction,
    /// Asset units taken from the caller.
    pub ask_tokens: u128,
    /// Shannons delivered to the caller, fee included.
    pub bid_tokens: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmOutcome {
    pub tx_hash: TxHash,
    pub tx: Transaction,
}

pub struct SwapService {
    ctx: SwapContext,
}

impl SwapService {
    pub fn new(ctx: SwapContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SwapContext {
        &self.ctx
    }

    pub fn udt_name(&self) -> &UdtName {
        &self.ctx.settings.udt_name
    }

    /// Releases cells still in LOCKED together with the saved transaction under `key`.
    fn release_locked(&self, key: &OutPoint, cells: &[OutPoint]) {
        for cell in cells {
            if let Err(err) = self.ctx.storage.cancel_locked_cell(cell, key) {
                warn!("failed to release locked cell cell={} key={} error={}", cell, key, err);
            }
        }
    }

    /// Moves committed cells out of COMMITTING and drops the signed transaction under `key`.
    fn release_committing(&self, key: &OutPoint, cells: &[OutPoint]) {
        for cell in cells {
            if let Err(err) = self.ctx.storage.cancel_committing_cell(cell, key) {
                warn!("failed to release committing cell cell={} key={} error={}", cell, key, err);
            }
        }
        if !cells.is_empty() {
            self.ctx.observer.on_rolled_back(key, cells.len());
        }
    }
}
