//! Background tasks of the `all` mode and the supervisor that ends the process when one of them stops.

use crate::service::metrics::Metrics;
use futures_util::future::select_all;
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use swap_core::application::{Assembler, Refresher, SignerWorker, SwapContext};
use swap_core::foundation::SwapError;
use swap_core::infrastructure::signing::TxSigner;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<(), SwapError>> + Send>>;

/// A named long-running task. None of them is expected to return.
pub struct SupervisedTask {
    pub name: &'static str,
    pub handle: JoinHandle<Result<(), SwapError>>,
}

impl SupervisedTask {
    pub fn spawn(name: &'static str, task: TaskFuture) -> Self {
        debug!("spawning supervised task name={}", name);
        Self { name, handle: tokio::spawn(task) }
    }
}

pub async fn run_refresher(ctx: SwapContext, every: Duration, metrics: Arc<Metrics>) -> Result<(), SwapError> {
    info!("refresher started interval_secs={}", every.as_secs());
    let refresher = Refresher::new(ctx.clone());
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let ok = match refresher.run_cycle().await {
            Ok(report) => {
                debug!(
                    "refresh cycle done candidates={} dust={} newly_cached={} resolved={} resent={} purged={}",
                    report.candidates,
                    report.dust,
                    report.newly_cached,
                    report.resolved,
                    report.resent,
                    report.purged
                );
                true
            }
            Err(err) => {
                warn!("refresh cycle failed error={}", err);
                false
            }
        };
        ctx.observer.on_worker_cycle("refresher", ok);
        match ctx.storage.pool_snapshot() {
            Ok(snapshot) => metrics.set_pool_sizes(&snapshot),
            Err(err) => debug!("pool snapshot failed error={}", err),
        }
    }
}

pub async fn run_assembler(ctx: SwapContext, every: Duration) -> Result<(), SwapError> {
    info!("assembler started interval_secs={}", every.as_secs());
    let assembler = Assembler::new(ctx.clone());
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let ok = match assembler.run_cycle().await {
            Ok(report) => {
                debug!("assembler cycle done dust={} batches={} enqueued={}", report.dust, report.batches, report.enqueued);
                true
            }
            Err(err) => {
                warn!("assembler cycle failed error={}", err);
                false
            }
        };
        ctx.observer.on_worker_cycle("assembler", ok);
    }
}

/// The signing worker returns once the queue closes, which the supervisor treats as fatal.
pub async fn run_signer(ctx: SwapContext, signer: Arc<dyn TxSigner>) -> Result<(), SwapError> {
    SignerWorker::new(ctx, signer).run().await?;
    Err(SwapError::QueueError("job queue closed".to_string()))
}

/// Spawns the refresher, assembler and signing worker.
pub fn spawn_workers(
    ctx: &SwapContext,
    signer: Arc<dyn TxSigner>,
    refresher_every: Duration,
    assembler_every: Duration,
    metrics: Arc<Metrics>,
) -> Vec<SupervisedTask> {
    vec![
        SupervisedTask::spawn("refresher", Box::pin(run_refresher(ctx.clone(), refresher_every, metrics))),
        SupervisedTask::spawn("assembler", Box::pin(run_assembler(ctx.clone(), assembler_every))),
        SupervisedTask::spawn("signer", Box::pin(run_signer(ctx.clone(), signer))),
    ]
}

/// Waits for the first task to end and reports why. The rest are aborted.
pub async fn supervise(tasks: Vec<SupervisedTask>) -> SwapError {
    if tasks.is_empty() {
        return SwapError::Message("no tasks to supervise".to_string());
    }
    let names = tasks.iter().map(|task| task.name).collect::<Vec<_>>();
    let (outcome, index, rest) = select_all(tasks.into_iter().map(|task| task.handle)).await;
    for handle in rest {
        handle.abort();
    }
    let name = names.get(index).copied().unwrap_or("unknown");
    match outcome {
        Ok(Ok(())) => SwapError::Message(format!("task {name} exited")),
        Ok(Err(err)) => SwapError::Message(format!("task {name} failed: {err}")),
        Err(join_err) => SwapError::Message(format!("task {name} aborted: {join_err}")),
    }
}
