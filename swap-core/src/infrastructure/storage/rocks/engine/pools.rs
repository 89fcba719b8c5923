use super::RocksStorage;
use crate::domain::ledger::OutPoint;
use crate::domain::reservation::{is_expired, PoolEntry, PoolSnapshot, RefreshOutcome};
use crate::foundation::SwapError;
use crate::infrastructure::storage::rocks::schema::*;
use crate::infrastructure::storage::rocks::util::{
    acquire_with_timeout, decode_score, out_point_key, parse_out_point_key, parse_score_index_key, score_index_key,
};
use crate::infrastructure::storage::ReservationStore;
use crate::storage_err;
use log::{debug, trace};
use rocksdb::{IteratorMode, WriteBatch};
use std::collections::{BTreeMap, BTreeSet};

impl RocksStorage {
    fn pool_score(&self, cf_name: &str, out_point: &OutPoint) -> Result<Option<u64>, SwapError> {
        let cf = self.cf_handle(cf_name)?;
        match self.db.get_cf(cf, out_point_key(out_point)).map_err(|err| storage_err!(format!("rocksdb get_cf {cf_name}"), err))? {
            Some(bytes) => Ok(Some(decode_score(&bytes)?)),
            None => Ok(None),
        }
    }

    fn is_reserved(&self, out_point: &OutPoint, now: u64) -> Result<bool, SwapError> {
        for cf_name in [CF_POOL_LOCKED, CF_POOL_COMMITTING] {
            if self.pool_score(cf_name, out_point)?.is_some_and(|score| !is_expired(score, now)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn pool_entries(&self, cf_name: &str) -> Result<BTreeMap<OutPoint, u64>, SwapError> {
        self.scan_cf(cf_name)?.iter().map(|(key, value)| Ok((parse_out_point_key(key)?, decode_score(value)?))).collect()
    }

    fn write_pool_batch(&self, batch: WriteBatch, operation: &'static str) -> Result<(), SwapError> {
        self.db.write(batch).map_err(|err| storage_err!(format!("rocksdb write {operation}"), err))
    }
}

impl ReservationStore for RocksStorage {
    fn lock_cell(&self, now: u64, expires_at: u64) -> Result<Option<OutPoint>, SwapError> {
        let _guard = acquire_with_timeout(&self.pool_lock, "lock_cell")?;
        let index_cf = self.cf_handle(CF_POOL_LIVE_BY_SCORE)?;
        let mut candidate = None;
        for item in self.db.iterator_cf(index_cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|err| storage_err!("rocksdb iterate live_by_score", err))?;
            let (score, out_point) = parse_score_index_key(&key)?;
            if !self.is_reserved(&out_point, now)? {
                candidate = Some((score, out_point));
                break;
            }
        }
        let Some((score, out_point)) = candidate else {
            trace!("lock_cell: no eligible live cell");
            return Ok(None);
        };

        let key = out_point_key(&out_point);
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf_handle(CF_POOL_LIVE)?, &key);
        batch.delete_cf(index_cf, score_index_key(score, &out_point));
        batch.delete_cf(self.cf_handle(CF_POOL_COMMITTING)?, &key);
        batch.put_cf(self.cf_handle(CF_POOL_LOCKED)?, &key, expires_at.to_be_bytes());
        self.write_pool_batch(batch, "lock_cell")?;
        debug!("lock_cell out_point={} expires_at={}", out_point, expires_at);
        Ok(Some(out_point))
    }

    fn commit_cell(&self, out_point: &OutPoint, now: u64, expires_at: u64) -> Result<bool, SwapError> {
        let _guard = acquire_with_timeout(&self.pool_lock, "commit_cell")?;
        match self.pool_score(CF_POOL_LOCKED, out_point)? {
            Some(score) if !is_expired(score, now) => {
                let key = out_point_key(out_point);
                let mut batch = WriteBatch::default();
                batch.delete_cf(self.cf_handle(CF_POOL_LOCKED)?, &key);
                batch.put_cf(self.cf_handle(CF_POOL_COMMITTING)?, &key, expires_at.to_be_bytes());
                self.write_pool_batch(batch, "commit_cell")?;
                debug!("commit_cell out_point={} expires_at={}", out_point, expires_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn cancel_locked_cell(&self, out_point: &OutPoint, tx_key: &OutPoint) -> Result<(), SwapError> {
        let _guard = acquire_with_timeout(&self.pool_lock, "cancel_locked_cell")?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf_handle(CF_POOL_LOCKED)?, out_point_key(out_point));
        batch.delete_cf(self.cf_handle(CF_SAVED_TX)?, out_point_key(tx_key));
        self.write_pool_batch(batch, "cancel_locked_cell")?;
        debug!("cancel_locked_cell out_point={} tx_key={}", out_point, tx_key);
        Ok(())
    }

    fn cancel_committing_cell(&self, out_point: &OutPoint, tx_key: &OutPoint) -> Result<(), SwapError> {
        let _guard = acquire_with_timeout(&self.pool_lock, "cancel_committing_cell")?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf_handle(CF_POOL_COMMITTING)?, out_point_key(out_point));
        batch.delete_cf(self.cf_handle(CF_SIGNED_TX)?, out_point_key(tx_key));
        self.write_pool_batch(batch, "cancel_committing_cell")?;
        debug!("cancel_committing_cell out_point={} tx_key={}", out_point, tx_key);
        Ok(())
    }

    fn refresh(&self, candidates: &[OutPoint], now: u64) -> Result<RefreshOutcome, SwapError> {
        let _guard = acquire_with_timeout(&self.pool_lock, "refresh")?;
        let live_cf = self.cf_handle(CF_POOL_LIVE)?;
        let index_cf = self.cf_handle(CF_POOL_LIVE_BY_SCORE)?;
        let mut batch = WriteBatch::default();
        let mut outcome = RefreshOutcome::default();

        let mut reserved = BTreeSet::new();
        for (cf_name, expired) in [(CF_POOL_LOCKED, &mut outcome.expired_locked), (CF_POOL_COMMITTING, &mut outcome.expired_committing)] {
            let cf = self.cf_handle(cf_name)?;
            for (out_point, score) in self.pool_entries(cf_name)? {
                if is_expired(score, now) {
                    batch.delete_cf(cf, out_point_key(&out_point));
                    *expired += 1;
                } else {
                    reserved.insert(out_point);
                }
            }
        }

        let previous = self.pool_entries(CF_POOL_LIVE)?;
        let next: BTreeSet<OutPoint> = candidates.iter().filter(|out_point| !reserved.contains(*out_point)).copied().collect();
        for (out_point, score) in &previous {
            if !next.contains(out_point) {
                batch.delete_cf(live_cf, out_point_key(out_point));
                batch.delete_cf(index_cf, score_index_key(*score, out_point));
            }
        }
        for out_point in &next {
            if !previous.contains_key(out_point) {
                batch.put_cf(live_cf, out_point_key(out_point), now.to_be_bytes());
                batch.put_cf(index_cf, score_index_key(now, out_point), b"");
                outcome.added += 1;
            }
        }
        outcome.live = next.len();

        self.write_pool_batch(batch, "refresh")?;
        debug!(
            "refresh live={} added={} expired_locked={} expired_committing={}",
            outcome.live, outcome.added, outcome.expired_locked, outcome.expired_committing
        );
        Ok(outcome)
    }

    fn pool_snapshot(&self) -> Result<PoolSnapshot, SwapError> {
        let entries = |cf_name: &str| -> Result<Vec<PoolEntry>, SwapError> {
            Ok(self.pool_entries(cf_name)?.into_iter().map(|(out_point, score)| PoolEntry { out_point, score }).collect())
        };
        Ok(PoolSnapshot { live: entries(CF_POOL_LIVE)?, locked: entries(CF_POOL_LOCKED)?, committing: entries(CF_POOL_COMMITTING)? })
    }
}
