//! Periodic reconciliation of the pools and the pending broadcasts against the chain.

use crate::application::context::SwapContext;
use crate::domain::ledger::OutPoint;
use crate::domain::reservation::RefreshOutcome;
use crate::domain::swap::{reservation_key, PendingBroadcast};
use crate::foundation::util::time::now_secs;
use crate::foundation::{Result, TxHash};
use crate::infrastructure::chain::{collect_cells, CellQuery, TxStatus};
use log::{debug, info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub candidates: usize,
    pub dust: usize,
    pub newly_cached: usize,
    pub pools: RefreshOutcome,
    pub resolved: usize,
    pub resent: usize,
    pub purged: usize,
}

pub struct Refresher {
    ctx: SwapContext,
}

impl Refresher {
    pub fn new(ctx: SwapContext) -> Self {
        Self { ctx }
    }

    pub async fn run_cycle(&self) -> Result<RefreshReport> {
        let settings = &self.ctx.settings;
        let lock = self.ctx.fund_pool.lock.clone();
        let asset_query = CellQuery::by_lock(lock.clone()).with_type(settings.udt_script.clone());
        let asset_cells = collect_cells(self.ctx.chain.as_ref(), &asset_query).await?;
        let plain_cells = collect_cells(self.ctx.chain.as_ref(), &CellQuery::by_lock(lock).plain()).await?;
        let (candidates, mut dust): (Vec<_>, Vec<_>) =
            asset_cells.into_iter().partition(|cell| cell.output.capacity >= settings.min_udt_cell);
        dust.extend(plain_cells);

        let mut report = RefreshReport { candidates: candidates.len(), dust: dust.len(), ..RefreshReport::default() };
        for cell in candidates.iter().chain(dust.iter()) {
            if self.ctx.storage.put_cached_cell(cell)? {
                report.newly_cached += 1;
            }
        }
        let now = now_secs();
        let out_points = candidates.iter().map(|cell| cell.out_point).collect::<Vec<_>>();
        report.pools = self.ctx.storage.refresh(&out_points, now)?;

        let (resolved, resent) = self.reconcile_pending().await?;
        report.resolved = resolved;
        report.resent = resent;
        report.purged = self.ctx.storage.purge_expired(now)?;

        info!(
            "refresh cycle done live={} added={} expired_locked={} expired_committing={} dust={} resolved={} resent={} purged={}",
            report.pools.live,
            report.pools.added,
            report.pools.expired_locked,
            report.pools.expired_committing,
            report.dust,
            report.resolved,
            report.resent,
            report.purged
        );
        Ok(report)
    }

    /// Settles pending broadcasts the chain has decided on; returns (resolved, resent).
    async fn reconcile_pending(&self) -> Result<(usize, usize)> {
        let mut resolved: Vec<TxHash> = Vec::new();
        let mut resent = 0usize;
        for pending in self.ctx.storage.pending_broadcasts()? {
            let status = match self.ctx.chain.get_transaction_status(&pending.tx_hash).await {
                Ok(status) => status,
                Err(err) => {
                    warn!("status query failed; keeping pending tx_hash={} error={}", pending.tx_hash, err);
                    continue;
                }
            };
            debug!("pending broadcast status tx_hash={} status={}", pending.tx_hash, status.as_str());
            match status {
                TxStatus::Pending | TxStatus::Proposed => {}
                TxStatus::Committed => {
                    self.release(&pending, false);
                    resolved.push(pending.tx_hash);
                }
                TxStatus::Rejected => {
                    warn!("pending transaction rejected; releasing its cells tx_hash={}", pending.tx_hash);
                    self.release(&pending, true);
                    resolved.push(pending.tx_hash);
                }
                TxStatus::Unknown => match self.ctx.chain.send_transaction(&pending.tx).await {
                    Ok(_) => {
                        info!("resent unknown transaction tx_hash={}", pending.tx_hash);
                        resent += 1;
                    }
                    Err(err) => {
                        warn!("resend failed; releasing its cells tx_hash={} error={}", pending.tx_hash, err);
                        self.release(&pending, true);
                        resolved.push(pending.tx_hash);
                    }
                },
            }
        }
        let removed = if resolved.is_empty() { 0 } else { self.ctx.storage.remove_pending_broadcasts(&resolved)? };
        Ok((removed, resent))
    }

    /// Clears the COMMITTING entries of a settled broadcast. Only a failed swap counts as a rollback.
    fn release(&self, pending: &PendingBroadcast, rolled_back: bool) {
        let key: OutPoint = match reservation_key(&pending.tx) {
            Some(key) => key,
            None => return,
        };
        for cell in &pending.committed_cells {
            if let Err(err) = self.ctx.storage.cancel_committing_cell(cell, &key) {
                warn!("failed to release committing cell cell={} tx_hash={} error={}", cell, pending.tx_hash, err);
            }
        }
        if rolled_back {
            self.ctx.observer.on_rolled_back(&key, pending.committed_cells.len());
        }
    }
}
