use crate::fixtures::*;
use rust_decimal::Decimal;
use swap_core::domain::ledger::Transaction;
use swap_core::domain::reservation::CellPool;
use swap_core::domain::swap::{PendingBroadcast, SavedTransaction};
use swap_core::foundation::UdtName;
use swap_core::infrastructure::storage::{ReservationStore, RocksStorage, Storage};
use tempfile::TempDir;

const NOW: u64 = 1_700_000_000;

fn trade() -> Transaction {
    let caller = plain_cell(1, caller_lock(), 100 * CKB);
    TradeBuilder::new(250 * CKB, 1_000 * UNIT).input(&caller).build()
}

#[test]
fn test_rocks_storage_when_reopened_then_records_and_pools_survive() {
    let dir = TempDir::new().expect("temp dir");
    let udt = UdtName::new(TEST_UDT_NAME);
    let tx = trade();
    let cell = asset_cell(10, caller_lock(), 1_000 * CKB, 5 * UNIT);
    {
        let storage = RocksStorage::open_in_dir_with_options(dir.path(), false).expect("open");
        storage.refresh(&[out_point(10), out_point(11)], NOW).expect("refresh");
        let locked = storage.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
        assert_eq!(locked, out_point(10));
        let saved = SavedTransaction { tx: tx.clone(), reserved_cells: vec![locked], valid_until: NOW + 60 };
        storage.put_saved_tx(&saved, NOW + 120).expect("save");
        storage.put_signed_tx(&out_point(12), &tx, NOW + 240).expect("signed");
        storage
            .push_pending_broadcast(&PendingBroadcast { tx_hash: tx.hash(), tx: tx.clone(), committed_cells: vec![out_point(12)], submitted_at: NOW })
            .expect("pending");
        assert!(storage.put_cached_cell(&cell).expect("cache"));
        storage.set_price(&udt, Decimal::new(123_456, 6)).expect("price");
    }

    let storage = RocksStorage::open_in_dir_with_options(dir.path(), false).expect("reopen");
    let snapshot = storage.pool_snapshot().expect("snapshot");
    assert_eq!(snapshot.pool_of(&out_point(10)), Some(CellPool::Locked));
    assert_eq!(snapshot.pool_of(&out_point(11)), Some(CellPool::Live));
    let saved = storage.get_saved_tx(&out_point(10), NOW).expect("read").expect("saved");
    assert_eq!(saved.tx, tx);
    assert_eq!(storage.pending_broadcasts().expect("pending")[0].tx_hash, tx.hash());
    assert_eq!(storage.get_cached_cell(&cell.out_point).expect("cache"), Some(cell.clone()));
    assert!(!storage.put_cached_cell(&cell).expect("cache again"));
    assert_eq!(storage.get_price(&udt).expect("price"), Some(Decimal::new(123_456, 6)));
    assert_eq!(storage.take_signed_tx(&out_point(12), NOW).expect("take"), Some(tx));
    assert_eq!(storage.take_signed_tx(&out_point(12), NOW).expect("take again"), None);
}

#[test]
fn test_rocks_storage_ttl_records_expire_and_purge() {
    let dir = TempDir::new().expect("temp dir");
    let storage = RocksStorage::open_in_dir_with_options(dir.path(), false).expect("open");
    let tx = trade();
    let saved = SavedTransaction { tx: tx.clone(), reserved_cells: vec![out_point(10)], valid_until: NOW + 60 };
    storage.put_saved_tx(&saved, NOW + 120).expect("save");
    storage.put_signed_tx(&out_point(11), &tx, NOW + 60).expect("signed");

    assert!(storage.get_saved_tx(&out_point(10), NOW + 121).expect("read").is_none());
    assert_eq!(storage.purge_expired(NOW + 100).expect("purge"), 1);
    assert!(storage.get_saved_tx(&out_point(10), NOW + 100).expect("read").is_some());
    assert_eq!(storage.purge_expired(NOW + 200).expect("purge"), 1);
    assert!(storage.get_saved_tx(&out_point(10), NOW).expect("read").is_none());
}

#[test]
fn test_rocks_storage_cancel_locked_removes_saved_tx() {
    let dir = TempDir::new().expect("temp dir");
    let storage = RocksStorage::open_in_dir_with_options(dir.path(), false).expect("open");
    storage.refresh(&[out_point(10)], NOW).expect("refresh");
    let locked = storage.lock_cell(NOW, NOW + 60).expect("lock").expect("cell");
    let saved = SavedTransaction { tx: trade(), reserved_cells: vec![locked], valid_until: NOW + 60 };
    storage.put_saved_tx(&saved, NOW + 120).expect("save");

    storage.cancel_locked_cell(&locked, &locked).expect("cancel");

    assert!(storage.get_saved_tx(&locked, NOW).expect("read").is_none());
    assert!(storage.pool_snapshot().expect("snapshot").locked.is_empty());
}

#[test]
fn test_rocks_storage_remove_pending_counts_present_hashes() {
    let dir = TempDir::new().expect("temp dir");
    let storage = RocksStorage::open_in_dir_with_options(dir.path(), false).expect("open");
    let tx = trade();
    storage
        .push_pending_broadcast(&PendingBroadcast { tx_hash: tx.hash(), tx: tx.clone(), committed_cells: vec![out_point(10)], submitted_at: NOW })
        .expect("pending");

    let other = Transaction::default().hash();
    assert_eq!(storage.remove_pending_broadcasts(&[tx.hash(), other]).expect("remove"), 1);
    assert!(storage.pending_broadcasts().expect("pending").is_empty());
}
