//! The pool procedures must behave identically on every store.

use crate::fixtures::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use swap_core::domain::ledger::OutPoint;
use swap_core::domain::reservation::CellPool;
use swap_core::infrastructure::storage::{MemoryStorage, RocksStorage, SwapStorage};
use tempfile::TempDir;

const NOW: u64 = 1_700_000_000;

fn rocks() -> (TempDir, Arc<RocksStorage>) {
    let dir = TempDir::new().expect("temp dir");
    let storage = RocksStorage::open_in_dir_with_options(dir.path(), false).expect("open rocksdb");
    (dir, Arc::new(storage))
}

fn cells(range: std::ops::Range<u8>) -> Vec<OutPoint> {
    range.map(out_point).collect()
}

fn lock_takes_lowest_score_then_outpoint(store: &dyn SwapStorage) {
    store.refresh(&cells(3..5), NOW).expect("refresh");
    store.refresh(&cells(1..5), NOW + 10).expect("refresh");

    // 3 and 4 keep their first score, 1 and 2 are newer.
    assert_eq!(store.lock_cell(NOW + 10, NOW + 70).expect("lock"), Some(out_point(3)));
    assert_eq!(store.lock_cell(NOW + 10, NOW + 70).expect("lock"), Some(out_point(4)));
    assert_eq!(store.lock_cell(NOW + 10, NOW + 70).expect("lock"), Some(out_point(1)));
    assert_eq!(store.lock_cell(NOW + 10, NOW + 70).expect("lock"), Some(out_point(2)));
    assert_eq!(store.lock_cell(NOW + 10, NOW + 70).expect("lock"), None);
}

fn commit_needs_unexpired_lock(store: &dyn SwapStorage) {
    store.refresh(&cells(1..3), NOW).expect("refresh");
    let first = store.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
    let second = store.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");

    assert!(store.commit_cell(&first, NOW + 60, NOW + 180).expect("commit"));
    assert!(!store.commit_cell(&first, NOW + 60, NOW + 180).expect("recommit"));
    assert!(!store.commit_cell(&second, NOW + 61, NOW + 180).expect("expired"));
    assert!(!store.commit_cell(&out_point(9), NOW, NOW + 180).expect("unknown"));

    let snapshot = store.pool_snapshot().expect("snapshot");
    assert_eq!(snapshot.pool_of(&first), Some(CellPool::Committing));
    assert_eq!(snapshot.pool_of(&second), Some(CellPool::Locked));
}

fn refresh_expires_and_skips_reserved(store: &dyn SwapStorage) {
    store.refresh(&cells(1..4), NOW).expect("refresh");
    let locked = store.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
    let committed = store.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
    assert!(store.commit_cell(&committed, NOW, NOW + 120).expect("commit"));

    let outcome = store.refresh(&cells(1..5), NOW + 30).expect("refresh");
    assert_eq!((outcome.live, outcome.added, outcome.expired_locked, outcome.expired_committing), (2, 1, 0, 0));

    let outcome = store.refresh(&cells(1..5), NOW + 90).expect("refresh");
    assert_eq!((outcome.expired_locked, outcome.expired_committing), (1, 0));
    let snapshot = store.pool_snapshot().expect("snapshot");
    assert_eq!(snapshot.pool_of(&locked), Some(CellPool::Live));
    assert_eq!(snapshot.pool_of(&committed), Some(CellPool::Committing));

    let outcome = store.refresh(&cells(1..5), NOW + 121).expect("refresh");
    assert_eq!(outcome.expired_committing, 1);
    assert_eq!(store.pool_snapshot().expect("snapshot").live.len(), 4);
}

fn refresh_drops_vanished_live_cells(store: &dyn SwapStorage) {
    store.refresh(&cells(1..4), NOW).expect("refresh");
    let outcome = store.refresh(&cells(2..3), NOW + 1).expect("refresh");
    assert_eq!((outcome.live, outcome.added), (1, 0));
    assert_eq!(store.lock_cell(NOW + 1, NOW + 61).expect("lock"), Some(out_point(2)));
}

fn cancels_are_idempotent_and_scoped(store: &dyn SwapStorage) {
    store.refresh(&cells(1..3), NOW).expect("refresh");
    let locked = store.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
    let committed = store.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
    assert!(store.commit_cell(&committed, NOW, NOW + 120).expect("commit"));

    // Wrong pool: nothing moves.
    store.cancel_committing_cell(&locked, &locked).expect("cancel");
    store.cancel_locked_cell(&committed, &committed).expect("cancel");
    let snapshot = store.pool_snapshot().expect("snapshot");
    assert_eq!(snapshot.pool_of(&locked), Some(CellPool::Locked));
    assert_eq!(snapshot.pool_of(&committed), Some(CellPool::Committing));

    store.cancel_locked_cell(&locked, &locked).expect("cancel");
    store.cancel_locked_cell(&locked, &locked).expect("cancel again");
    store.cancel_committing_cell(&committed, &committed).expect("cancel");
    let snapshot = store.pool_snapshot().expect("snapshot");
    assert!(snapshot.locked.is_empty() && snapshot.committing.is_empty() && snapshot.live.is_empty());
}

fn concurrent_locks_are_unique<S: SwapStorage + 'static>(store: Arc<S>) {
    store.refresh(&cells(1..41), NOW).expect("refresh");
    let handles = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(cell) = store.lock_cell(NOW, NOW + 60).expect("lock") {
                    taken.push(cell);
                }
                taken
            })
        })
        .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    for handle in handles {
        for cell in handle.join().expect("thread") {
            assert!(seen.insert(cell), "cell {cell} locked twice");
        }
    }
    assert_eq!(seen.len(), 40);
    assert_eq!(store.pool_snapshot().expect("snapshot").locked.len(), 40);
}

macro_rules! contract {
    ($name:ident, $check:ident) => {
        mod $name {
            use super::*;

            #[test]
            fn memory() {
                $check(&MemoryStorage::new());
            }

            #[test]
            fn rocks() {
                let (_dir, store) = super::rocks();
                $check(store.as_ref());
            }
        }
    };
}

contract!(lock_order, lock_takes_lowest_score_then_outpoint);
contract!(commit_window, commit_needs_unexpired_lock);
contract!(refresh_expiry, refresh_expires_and_skips_reserved);
contract!(refresh_vanished, refresh_drops_vanished_live_cells);
contract!(cancel, cancels_are_idempotent_and_scoped);

#[test]
fn test_concurrent_lock_cell_memory() {
    concurrent_locks_are_unique(Arc::new(MemoryStorage::new()));
}

#[test]
fn test_concurrent_lock_cell_rocks() {
    let (_dir, store) = rocks();
    concurrent_locks_are_unique(store);
}
