use crate::domain::ledger::{Cell, OutPoint, Transaction};
use crate::domain::reservation::{is_expired, PoolSnapshot, RefreshOutcome, ReservationPools};
use crate::domain::swap::{PendingBroadcast, SavedTransaction};
use crate::foundation::{Result, SwapError, TxHash, UdtName};
use crate::infrastructure::storage::{ReservationStore, Storage};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MemoryInner {
    pools: ReservationPools,
    saved: HashMap<OutPoint, (u64, SavedTransaction)>,
    signed: HashMap<OutPoint, (u64, Transaction)>,
    pending: Vec<PendingBroadcast>,
    cells: HashMap<OutPoint, Cell>,
    prices: HashMap<UdtName, Decimal>,
}

pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(MemoryInner::default())) }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| SwapError::StorageError { operation: "memory storage lock".to_string(), details: "poisoned".to_string() })
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn put_saved_tx(&self, saved: &SavedTransaction, expires_at: u64) -> Result<()> {
        let key = saved.key().ok_or_else(|| SwapError::invalid_input("saved transaction reserves no cell"))?;
        self.lock_inner()?.saved.insert(key, (expires_at, saved.clone()));
        Ok(())
    }

    fn get_saved_tx(&self, key: &OutPoint, now: u64) -> Result<Option<SavedTransaction>> {
        let inner = self.lock_inner()?;
        Ok(inner.saved.get(key).filter(|(expires_at, _)| !is_expired(*expires_at, now)).map(|(_, saved)| saved.clone()))
    }

    fn delete_saved_tx(&self, key: &OutPoint) -> Result<()> {
        self.lock_inner()?.saved.remove(key);
        Ok(())
    }

    fn put_signed_tx(&self, key: &OutPoint, tx: &Transaction, expires_at: u64) -> Result<()> {
        self.lock_inner()?.signed.insert(*key, (expires_at, tx.clone()));
        Ok(())
    }

    fn take_signed_tx(&self, key: &OutPoint, now: u64) -> Result<Option<Transaction>> {
        let mut inner = self.lock_inner()?;
        match inner.signed.remove(key) {
            Some((expires_at, tx)) if !is_expired(expires_at, now) => Ok(Some(tx)),
            _ => Ok(None),
        }
    }

    fn push_pending_broadcast(&self, pending: &PendingBroadcast) -> Result<()> {
        self.lock_inner()?.pending.push(pending.clone());
        Ok(())
    }

    fn pending_broadcasts(&self) -> Result<Vec<PendingBroadcast>> {
        Ok(self.lock_inner()?.pending.clone())
    }

    fn remove_pending_broadcasts(&self, tx_hashes: &[TxHash]) -> Result<usize> {
        let mut inner = self.lock_inner()?;
        let before = inner.pending.len();
        inner.pending.retain(|pending| !tx_hashes.contains(&pending.tx_hash));
        Ok(before - inner.pending.len())
    }

    fn get_cached_cell(&self, out_point: &OutPoint) -> Result<Option<Cell>> {
        Ok(self.lock_inner()?.cells.get(out_point).cloned())
    }

    fn put_cached_cell(&self, cell: &Cell) -> Result<bool> {
        let mut inner = self.lock_inner()?;
        if inner.cells.contains_key(&cell.out_point) {
            return Ok(false);
        }
        inner.cells.insert(cell.out_point, cell.clone());
        Ok(true)
    }

    fn set_price(&self, udt: &UdtName, price: Decimal) -> Result<()> {
        self.lock_inner()?.prices.insert(udt.clone(), price);
        Ok(())
    }

    fn get_price(&self, udt: &UdtName) -> Result<Option<Decimal>> {
        Ok(self.lock_inner()?.prices.get(udt).copied())
    }

    fn purge_expired(&self, now: u64) -> Result<usize> {
        let mut inner = self.lock_inner()?;
        let before = inner.saved.len() + inner.signed.len();
        inner.saved.retain(|_, (expires_at, _)| !is_expired(*expires_at, now));
        inner.signed.retain(|_, (expires_at, _)| !is_expired(*expires_at, now));
        Ok(before - inner.saved.len() - inner.signed.len())
    }
}

impl ReservationStore for MemoryStorage {
    fn lock_cell(&self, now: u64, expires_at: u64) -> Result<Option<OutPoint>> {
        Ok(self.lock_inner()?.pools.lock_cell(now, expires_at))
    }

    fn commit_cell(&self, out_point: &OutPoint, now: u64, expires_at: u64) -> Result<bool> {
        Ok(self.lock_inner()?.pools.commit_cell(out_point, now, expires_at))
    }

    fn cancel_locked_cell(&self, out_point: &OutPoint, tx_key: &OutPoint) -> Result<()> {
        let mut inner = self.lock_inner()?;
        inner.pools.cancel_locked(out_point);
        inner.saved.remove(tx_key);
        Ok(())
    }

    fn cancel_committing_cell(&self, out_point: &OutPoint, tx_key: &OutPoint) -> Result<()> {
        let mut inner = self.lock_inner()?;
        inner.pools.cancel_committing(out_point);
        inner.signed.remove(tx_key);
        Ok(())
    }

    fn refresh(&self, candidates: &[OutPoint], now: u64) -> Result<RefreshOutcome> {
        Ok(self.lock_inner()?.pools.refresh(candidates, now))
    }

    fn pool_snapshot(&self) -> Result<PoolSnapshot> {
        Ok(self.lock_inner()?.pools.snapshot())
    }
}
