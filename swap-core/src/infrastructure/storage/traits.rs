use crate::domain::ledger::{Cell, OutPoint, Transaction};
use crate::domain::reservation::{PoolSnapshot, RefreshOutcome};
use crate::domain::swap::{PendingBroadcast, SavedTransaction};
use crate::foundation::{Result, TxHash, UdtName};
use rust_decimal::Decimal;

/// Swap records: saved and signed transactions, pending broadcasts, the cell cache and prices.
///
/// TTL records carry an absolute expiry in seconds; an expired record reads as absent even before
/// `purge_expired` removes it.
pub trait Storage: Send + Sync {
    fn put_saved_tx(&self, saved: &SavedTransaction, expires_at: u64) -> Result<()>;
    fn get_saved_tx(&self, key: &OutPoint, now: u64) -> Result<Option<SavedTransaction>>;
    fn delete_saved_tx(&self, key: &OutPoint) -> Result<()>;

    fn put_signed_tx(&self, key: &OutPoint, tx: &Transaction, expires_at: u64) -> Result<()>;
    /// Removes and returns the signed transaction stored under `key`, if present and unexpired.
    fn take_signed_tx(&self, key: &OutPoint, now: u64) -> Result<Option<Transaction>>;

    fn push_pending_broadcast(&self, pending: &PendingBroadcast) -> Result<()>;
    fn pending_broadcasts(&self) -> Result<Vec<PendingBroadcast>>;
    /// Returns how many of `tx_hashes` were present.
    fn remove_pending_broadcasts(&self, tx_hashes: &[TxHash]) -> Result<usize>;

    fn get_cached_cell(&self, out_point: &OutPoint) -> Result<Option<Cell>>;
    /// Stores the cell unless an entry already exists; returns `true` when inserted.
    fn put_cached_cell(&self, cell: &Cell) -> Result<bool>;

    fn set_price(&self, udt: &UdtName, price: Decimal) -> Result<()>;
    fn get_price(&self, udt: &UdtName) -> Result<Option<Decimal>>;

    /// Deletes expired saved and signed transactions; returns the number removed.
    fn purge_expired(&self, now: u64) -> Result<usize>;

    fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// The indivisible pool procedures. Each call is atomic with respect to every other call on the
/// same store and leaves state untouched when it reports failure.
pub trait ReservationStore: Send + Sync {
    /// Moves the earliest eligible LIVE cell into LOCKED until `expires_at`.
    fn lock_cell(&self, now: u64, expires_at: u64) -> Result<Option<OutPoint>>;

    /// Moves `out_point` from LOCKED to COMMITTING until `expires_at`; `false` if it is not held
    /// unexpired in LOCKED.
    fn commit_cell(&self, out_point: &OutPoint, now: u64, expires_at: u64) -> Result<bool>;

    /// Drops `out_point` from LOCKED and the saved transaction under `tx_key`. Idempotent.
    fn cancel_locked_cell(&self, out_point: &OutPoint, tx_key: &OutPoint) -> Result<()>;

    /// Drops `out_point` from COMMITTING and the signed transaction under `tx_key`. Idempotent.
    fn cancel_committing_cell(&self, out_point: &OutPoint, tx_key: &OutPoint) -> Result<()>;

    /// Expires stale reservations and replaces LIVE with the unreserved `candidates`.
    fn refresh(&self, candidates: &[OutPoint], now: u64) -> Result<RefreshOutcome>;

    /// Read-only copy of the pools. Never use it to decide a reservation.
    fn pool_snapshot(&self) -> Result<PoolSnapshot>;
}

/// Everything the swap flows need from one store.
pub trait SwapStorage: Storage + ReservationStore {}

impl<T: Storage + ReservationStore + ?Sized> SwapStorage for T {}
