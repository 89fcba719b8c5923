use crate::fixtures::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use swap_core::application::{Assembler, ConfirmOutcome, LifecycleObserver, Refresher};
use swap_core::domain::ledger::sighash::sighash_all_message;
use swap_core::domain::ledger::signature::{secret_key_hash, verify_pubkey_hash};
use swap_core::domain::ledger::udt::udt_amount;
use swap_core::domain::ledger::{OutPoint, Transaction};
use swap_core::domain::reservation::CellPool;
use swap_core::foundation::util::time::now_secs;
use swap_core::infrastructure::chain::TxStatus;
use swap_core::infrastructure::queue::{Job, JobQueue};
use swap_core::infrastructure::storage::Storage;

#[derive(Default)]
struct RollbackCounter(AtomicUsize);

impl LifecycleObserver for RollbackCounter {
    fn on_rolled_back(&self, _key: &OutPoint, _cells: usize) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs one refresh cycle under a counting observer and returns the rollbacks it saw.
async fn refresh_counting_rollbacks(harness: &Harness) -> usize {
    let counter = Arc::new(RollbackCounter::default());
    let ctx = harness.ctx.clone().with_observer(counter.clone());
    Refresher::new(ctx).run_cycle().await.expect("refresh cycle");
    counter.0.load(Ordering::SeqCst)
}

async fn confirmed(harness: &Harness) -> ConfirmOutcome {
    let caller = harness.add_caller_cell(1, 100 * CKB);
    harness.add_fund_cell(10, 1_000 * CKB, 0);
    harness.refresh().await;
    let tx = TradeBuilder::new(250 * CKB, 1_000 * UNIT).input(&caller).build();
    let outcome = harness.service().initiate(tx, &[0]).await.expect("initiate");
    let worker = harness.spawn_signer();
    let confirmed = harness.service().confirm(outcome.tx).await.expect("confirm");
    worker.abort();
    confirmed
}

#[tokio::test]
async fn test_refresh_when_pending_rejected_then_cells_return_to_live() {
    let harness = Harness::new();
    let confirmed = confirmed(&harness).await;
    let fund = out_point(10);
    harness.chain.set_status(confirmed.tx_hash, TxStatus::Rejected);

    let report = harness.refresh().await;

    assert_eq!(report.resolved, 1);
    assert!(harness.storage.pending_broadcasts().expect("pending").is_empty());
    assert!(harness.snapshot().committing.is_empty());

    harness.refresh().await;
    assert_eq!(harness.snapshot().pool_of(&fund), Some(CellPool::Live));
}

#[tokio::test]
async fn test_refresh_when_pending_committed_then_cells_forgotten() {
    let harness = Harness::new();
    let confirmed = confirmed(&harness).await;
    harness.chain.set_status(confirmed.tx_hash, TxStatus::Committed);
    harness.chain.remove_live_cell(&out_point(10));

    let report = harness.refresh().await;

    assert_eq!(report.resolved, 1);
    let snapshot = harness.snapshot();
    assert!(snapshot.live.is_empty() && snapshot.locked.is_empty() && snapshot.committing.is_empty());
}

#[tokio::test]
async fn test_refresh_when_pending_still_in_pool_then_kept() {
    let harness = Harness::new();
    confirmed(&harness).await;

    let report = harness.refresh().await;

    assert_eq!((report.resolved, report.resent), (0, 0));
    assert_eq!(harness.storage.pending_broadcasts().expect("pending").len(), 1);
    assert_eq!(harness.snapshot().pool_of(&out_point(10)), Some(CellPool::Committing));
}

#[tokio::test]
async fn test_refresh_when_pending_unknown_then_resent() {
    let harness = Harness::new();
    let confirmed = confirmed(&harness).await;
    harness.chain.set_status(confirmed.tx_hash, TxStatus::Unknown);

    let report = harness.refresh().await;

    assert_eq!(report.resent, 1);
    assert_eq!(harness.chain.submitted().len(), 2);
    assert_eq!(harness.storage.pending_broadcasts().expect("pending").len(), 1);
}

#[tokio::test]
async fn test_refresh_when_resend_fails_then_cells_released() {
    let harness = Harness::new();
    let confirmed = confirmed(&harness).await;
    harness.chain.set_status(confirmed.tx_hash, TxStatus::Unknown);
    harness.chain.fail_sends(Some("TransactionFailedToResolve"));

    let report = harness.refresh().await;

    assert_eq!((report.resolved, report.resent), (1, 0));
    assert!(harness.snapshot().committing.is_empty());
}

#[tokio::test]
async fn test_refresh_when_cell_below_minimum_then_counted_as_dust() {
    let harness = Harness::new();
    let big = harness.add_fund_cell(10, 1_000 * CKB, 0);
    let small = harness.add_fund_cell(11, 149 * CKB, 0);
    harness.add_caller_cell(1, 1_000 * CKB);

    let report = harness.refresh().await;

    assert_eq!((report.candidates, report.dust, report.newly_cached), (1, 1, 2));
    let snapshot = harness.snapshot();
    assert_eq!(snapshot.pool_of(&big.out_point), Some(CellPool::Live));
    assert_eq!(snapshot.pool_of(&small.out_point), None);

    let again = harness.refresh().await;
    assert_eq!((again.newly_cached, again.pools.added), (0, 0));
}

#[tokio::test]
async fn test_assembler_consolidates_dust_and_signer_sends_it() {
    let harness = Harness::new();
    harness.add_fund_dust(30, 700 * CKB);
    harness.add_fund_dust(31, 600 * CKB);
    harness.add_fund_cell(32, 100 * CKB, 3 * UNIT);
    harness.add_fund_cell(33, 1_000 * CKB, 0);

    let report = Assembler::new(harness.ctx.clone()).run_cycle().await.expect("assemble");

    assert_eq!((report.dust, report.batches, report.enqueued), (3, 1, 1));
    let job = harness.queue.dequeue().await.expect("dequeue").expect("job");
    assert_eq!(job.tx.inputs.len(), 3);
    assert_eq!(job.tx.outputs.len(), 1);
    assert!(job.tx.outputs[0].capacity > 1_399 * CKB && job.tx.outputs[0].capacity < 1_400 * CKB);
    assert_eq!(udt_amount(&job.tx.outputs_data[0]), 3 * UNIT);

    harness.signer_worker().process(job).await.expect("process");

    let submitted = harness.chain.submitted();
    assert_eq!(submitted.len(), 1);
    let group: Vec<usize> = (0..submitted[0].inputs.len()).collect();
    let message = sighash_all_message(&submitted[0], &group).expect("message");
    let lock = submitted[0].witness_args(0).expect("witness").and_then(|args| args.lock).expect("lock");
    assert!(verify_pubkey_hash(&lock, &message, &secret_key_hash(&harness.secret)));
}

#[tokio::test]
async fn test_assembler_without_dust_enqueues_nothing() {
    let harness = Harness::new();
    harness.add_fund_cell(10, 1_000 * CKB, 0);

    let report = Assembler::new(harness.ctx.clone()).run_cycle().await.expect("assemble");

    assert_eq!(report.enqueued, 0);
    assert!(harness.queue.is_empty().await);
}

#[tokio::test]
async fn test_signer_worker_drops_expired_job() {
    let harness = Harness::new();
    let job = Job::sign(out_point(10), Transaction::default(), 1);

    harness.signer_worker().process(job).await.expect("dropped");

    assert!(harness.storage.take_signed_tx(&out_point(10), 0).expect("read").is_none());
}

#[tokio::test]
async fn test_refresh_when_plain_cell_under_fund_lock_then_counted_as_dust_and_cached() {
    let harness = Harness::new();
    harness.add_fund_cell(10, 1_000 * CKB, 0);
    let plain = harness.add_fund_dust(30, 700 * CKB);

    let report = harness.refresh().await;

    assert_eq!((report.candidates, report.dust, report.newly_cached), (1, 1, 2));
    assert_eq!(harness.snapshot().pool_of(&plain.out_point), None);
    assert_eq!(harness.storage.get_cached_cell(&plain.out_point).expect("read"), Some(plain));
}

#[tokio::test]
async fn test_refresh_when_pending_committed_then_no_rollback_observed() {
    let harness = Harness::new();
    let confirmed = confirmed(&harness).await;
    harness.chain.set_status(confirmed.tx_hash, TxStatus::Committed);

    assert_eq!(refresh_counting_rollbacks(&harness).await, 0);
    assert!(harness.storage.pending_broadcasts().expect("pending").is_empty());
}

#[tokio::test]
async fn test_refresh_when_pending_rejected_then_rollback_observed() {
    let harness = Harness::new();
    let confirmed = confirmed(&harness).await;
    harness.chain.set_status(confirmed.tx_hash, TxStatus::Rejected);

    assert_eq!(refresh_counting_rollbacks(&harness).await, 1);
}

#[tokio::test]
async fn test_signer_worker_drops_sign_job_when_reservation_not_committing() {
    let harness = Harness::new();
    let caller = harness.add_caller_cell(1, 100 * CKB);
    harness.add_fund_cell(10, 1_000 * CKB, 0);
    harness.refresh().await;
    let tx = TradeBuilder::new(250 * CKB, 1_000 * UNIT).input(&caller).build();
    let outcome = harness.service().initiate(tx, &[0]).await.expect("initiate");
    assert_eq!(harness.snapshot().pool_of(&outcome.key), Some(CellPool::Locked));

    let job = Job::sign(outcome.key, outcome.tx, now_secs() + 60);
    harness.signer_worker().process(job).await.expect("dropped");

    assert!(harness.storage.take_signed_tx(&outcome.key, now_secs()).expect("read").is_none());
}
