use crate::application::context::SwapContext;
use crate::domain::reservation::CellPool;
use crate::foundation::util::time::now_secs;
use crate::foundation::Result;
use crate::infrastructure::queue::{Job, JobKind};
use crate::infrastructure::rpc::retry;
use crate::infrastructure::signing::TxSigner;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

const SEND_ATTEMPTS: usize = 3;
const SEND_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Drains the job queue: signs each transaction and either stores it for `confirm` or sends it.
pub struct SignerWorker {
    ctx: SwapContext,
    signer: Arc<dyn TxSigner>,
}

impl SignerWorker {
    pub fn new(ctx: SwapContext, signer: Arc<dyn TxSigner>) -> Self {
        Self { ctx, signer }
    }

    /// Runs until the queue closes. A failing job is logged and skipped.
    pub async fn run(&self) -> Result<()> {
        info!("signing worker started");
        while let Some(job) = self.ctx.queue.dequeue().await? {
            let kind = job.kind.as_str();
            let ok = match self.process(job).await {
                Ok(()) => true,
                Err(err) => {
                    warn!("signing job failed kind={} error={}", kind, err);
                    false
                }
            };
            self.ctx.observer.on_worker_cycle("signer", ok);
        }
        info!("job queue closed; signing worker stopped");
        Ok(())
    }

    pub async fn process(&self, job: Job) -> Result<()> {
        let now = now_secs();
        if job.is_expired(now) {
            debug!("dropping expired job kind={} tx_hash={}", job.kind.as_str(), job.tx.hash());
            return Ok(());
        }
        if let JobKind::Sign { target } = &job.kind {
            if self.ctx.storage.pool_snapshot()?.pool_of(target) != Some(CellPool::Committing) {
                debug!("dropping sign job; reservation is not committing target={} tx_hash={}", target, job.tx.hash());
                return Ok(());
            }
        }
        let signed = self.signer.sign(job.tx).await?;
        match job.kind {
            JobKind::Sign { target } => {
                let expires_at = now + 2 * self.ctx.settings.committing_seconds;
                self.ctx.storage.put_signed_tx(&target, &signed, expires_at)?;
                debug!("signed transaction stored target={} tx_hash={}", target, signed.hash());
            }
            JobKind::SignAndSend => {
                let chain = self.ctx.chain.clone();
                let tx_hash = retry(SEND_ATTEMPTS, SEND_RETRY_DELAY, || {
                    let chain = chain.clone();
                    let signed = signed.clone();
                    async move { chain.send_transaction(&signed).await }
                })
                .await?;
                info!("assembled transaction sent tx_hash={}", tx_hash);
            }
        }
        Ok(())
    }
}
