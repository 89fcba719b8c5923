use serde::Serialize;
use swap_core::domain::reservation::PoolEntry;
use swap_core::foundation::util::time::{now_secs, to_rfc3339};
use swap_core::foundation::SwapError;
use swap_core::infrastructure::storage::{ReservationStore, RocksStorage, Storage};

#[derive(Serialize)]
struct PoolRow {
    out_point: String,
    score: u64,
    /// Expiry of a reservation, or the time a LIVE cell was first seen.
    at: String,
}

#[derive(Serialize)]
struct PoolStatus {
    now: String,
    live: Vec<PoolRow>,
    locked: Vec<PoolRow>,
    committing: Vec<PoolRow>,
    pending_broadcasts: Vec<String>,
}

fn rows(entries: &[PoolEntry]) -> Vec<PoolRow> {
    entries
        .iter()
        .map(|entry| PoolRow { out_point: entry.out_point.to_string(), score: entry.score, at: to_rfc3339(entry.score) })
        .collect()
}

/// Read-only dump of the pools and the pending broadcast list.
pub fn print_pool_status(storage: &RocksStorage) -> Result<(), SwapError> {
    let snapshot = storage.pool_snapshot()?;
    let pending = storage.pending_broadcasts()?;
    let status = PoolStatus {
        now: to_rfc3339(now_secs()),
        live: rows(&snapshot.live),
        locked: rows(&snapshot.locked),
        committing: rows(&snapshot.committing),
        pending_broadcasts: pending.iter().map(|entry| entry.tx_hash.to_string()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
