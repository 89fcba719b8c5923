use super::{ConfirmOutcome, SwapService};
use crate::domain::ledger::json::JsonTransaction;
use crate::domain::ledger::{OutPoint, Transaction};
use crate::domain::swap::{matches_saved, reservation_key, PendingBroadcast, SwapPhase};
use crate::foundation::util::time::now_secs;
use crate::foundation::{Result, SwapError};
use crate::infrastructure::queue::Job;
use crate::infrastructure::rpc::poll_with_backoff;
use log::{info, warn};

impl SwapService {
    /// Commits the reservation behind a trade returned by the caller, waits for the signing worker
    /// and broadcasts the signed transaction.
    pub async fn confirm(&self, tx: Transaction) -> Result<ConfirmOutcome> {
        let result = self.try_confirm(tx).await;
        if let Err(err) = &result {
            self.ctx.observer.on_failed(SwapPhase::Confirming, err);
        }
        result
    }

    async fn try_confirm(&self, mut tx: Transaction) -> Result<ConfirmOutcome> {
        let settings = &self.ctx.settings;
        tx.normalize_outputs_data();
        let key = reservation_key(&tx).ok_or(SwapError::EmptyTransaction)?;
        let now = now_secs();
        let saved = self.ctx.storage.get_saved_tx(&key, now)?.ok_or(SwapError::ReservationInvalid)?;
        if !matches_saved(&tx, &saved) {
            warn!("confirm rejected: transaction differs from the saved one key={} tx_hash={}", key, tx.hash());
            return Err(SwapError::ReservationInvalid);
        }

        let cells = saved.reserved_cells;
        self.commit_all(&key, &cells, now, now + settings.committing_seconds)?;
        if let Err(err) = self.ctx.storage.delete_saved_tx(&key) {
            warn!("failed to delete saved transaction key={} error={}", key, err);
        }

        let signed = match self.wait_for_signature(&key, &tx, now).await {
            Ok(signed) => signed,
            Err(err) => {
                self.release_committing(&key, &cells);
                return Err(err);
            }
        };

        let tx_hash = signed.hash();
        if let Err(err) = self.ctx.chain.send_transaction(&signed).await {
            warn!("broadcast failed; releasing committed cells key={} tx_hash={} error={}", key, tx_hash, err);
            self.release_committing(&key, &cells);
            return Err(SwapError::BroadcastFailed {
                tx_hash: tx_hash.to_string(),
                details: err.to_string(),
                signed_tx: serde_json::to_value(JsonTransaction::from(&signed)).ok(),
            });
        }

        let pending = PendingBroadcast { tx_hash, tx: signed.clone(), committed_cells: cells, submitted_at: now_secs() };
        self.ctx.storage.push_pending_broadcast(&pending)?;
        info!("swap confirmed key={} tx_hash={}", key, tx_hash);
        self.ctx.observer.on_confirmed(&key, &tx_hash);
        Ok(ConfirmOutcome { tx_hash, tx: signed })
    }

    /// Moves every reserved cell from LOCKED to COMMITTING, or none of them.
    fn commit_all(&self, key: &OutPoint, cells: &[OutPoint], now: u64, expires_at: u64) -> Result<()> {
        for (index, cell) in cells.iter().enumerate() {
            let committed = match self.ctx.storage.commit_cell(cell, now, expires_at) {
                Ok(committed) => committed,
                Err(err) => {
                    self.release_committing(key, &cells[..index]);
                    self.release_locked(key, &cells[index..]);
                    return Err(err);
                }
            };
            if !committed {
                warn!("commit failed: cell is not locked or expired cell={} key={}", cell, key);
                self.release_committing(key, &cells[..index]);
                self.release_locked(key, &cells[index..]);
                return Err(SwapError::ReservationInvalid);
            }
        }
        Ok(())
    }

    async fn wait_for_signature(&self, key: &OutPoint, tx: &Transaction, now: u64) -> Result<Transaction> {
        let settings = &self.ctx.settings;
        let job = Job::sign(*key, tx.clone(), now + 2 * settings.committing_seconds);
        self.ctx.queue.enqueue(job).await?;

        // A job left over from an earlier, timed-out confirm of the same key may still land here.
        let storage = self.ctx.storage.clone();
        let key = *key;
        let expected = tx.hash();
        let poll = poll_with_backoff(settings.sign_poll, || {
            let storage = storage.clone();
            async move {
                storage.take_signed_tx(&key, now_secs()).map(|taken| match taken {
                    Some(signed) if signed.hash() == expected => Some(signed),
                    Some(stale) => {
                        warn!("discarding signed transaction of another trade key={} tx_hash={} expected={}", key, stale.hash(), expected);
                        None
                    }
                    None => None,
                })
            }
        });
        match tokio::time::timeout(settings.sign_timeout, poll).await {
            Ok(result) => result,
            Err(_) => {
                warn!("timed out waiting for signature key={} timeout_ms={}", key, settings.sign_timeout.as_millis());
                Err(SwapError::SigningTimeout { waited_ms: settings.sign_timeout.as_millis() as u64 })
            }
        }
    }
}
