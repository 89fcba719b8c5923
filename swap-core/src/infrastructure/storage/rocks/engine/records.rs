use super::RocksStorage;
use crate::domain::ledger::{Cell, OutPoint, Transaction};
use crate::domain::reservation::is_expired;
use crate::domain::swap::{PendingBroadcast, SavedTransaction};
use crate::foundation::{SwapError, TxHash, UdtName};
use crate::infrastructure::storage::rocks::schema::*;
use crate::infrastructure::storage::rocks::util::{acquire_with_timeout, out_point_key};
use crate::infrastructure::storage::Storage;
use crate::storage_err;
use log::{debug, trace};
use rocksdb::WriteBatch;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;

/// Value wrapper for records that carry a TTL.
#[derive(Serialize, Deserialize)]
struct Expiring<T> {
    expires_at: u64,
    value: T,
}

impl RocksStorage {
    fn key_pending(pending: &PendingBroadcast) -> Vec<u8> {
        KeyBuilder::with_capacity(8 + 32).u64_be(pending.submitted_at).prefix(pending.tx_hash.as_hash()).build()
    }

    fn key_price(udt: &UdtName) -> Vec<u8> {
        KeyBuilder::with_capacity(PRICE_KEY_PREFIX.len() + udt.as_str().len()).prefix(PRICE_KEY_PREFIX).str(udt.as_str()).build()
    }

    fn put_expiring<T: Serialize>(&self, cf_name: &str, key: &OutPoint, value: T, expires_at: u64) -> Result<(), SwapError> {
        let cf = self.cf_handle(cf_name)?;
        let bytes = Self::encode(&Expiring { expires_at, value })?;
        self.db.put_cf(cf, out_point_key(key), bytes).map_err(|err| storage_err!(format!("rocksdb put_cf {cf_name}"), err))
    }

    fn get_expiring<T: DeserializeOwned>(&self, cf_name: &str, key: &OutPoint, now: u64) -> Result<Option<T>, SwapError> {
        let cf = self.cf_handle(cf_name)?;
        let Some(bytes) = self.db.get_cf(cf, out_point_key(key)).map_err(|err| storage_err!(format!("rocksdb get_cf {cf_name}"), err))? else {
            return Ok(None);
        };
        let record: Expiring<T> = Self::decode(&bytes)?;
        Ok((!is_expired(record.expires_at, now)).then_some(record.value))
    }

    fn purge_cf<T: DeserializeOwned>(&self, cf_name: &str, now: u64, batch: &mut WriteBatch) -> Result<usize, SwapError> {
        let cf = self.cf_handle(cf_name)?;
        let mut purged = 0;
        for (key, value) in self.scan_cf(cf_name)? {
            let record: Expiring<T> = Self::decode(&value)?;
            if is_expired(record.expires_at, now) {
                batch.delete_cf(cf, key);
                purged += 1;
            }
        }
        Ok(purged)
    }
}

impl Storage for RocksStorage {
    fn put_saved_tx(&self, saved: &SavedTransaction, expires_at: u64) -> Result<(), SwapError> {
        let key = saved.key().ok_or_else(|| SwapError::invalid_input("saved transaction reserves no cell"))?;
        debug!("put_saved_tx key={} tx_hash={} expires_at={}", key, saved.tx.hash(), expires_at);
        self.put_expiring(CF_SAVED_TX, &key, saved, expires_at)
    }

    fn get_saved_tx(&self, key: &OutPoint, now: u64) -> Result<Option<SavedTransaction>, SwapError> {
        trace!("get_saved_tx key={}", key);
        self.get_expiring(CF_SAVED_TX, key, now)
    }

    fn delete_saved_tx(&self, key: &OutPoint) -> Result<(), SwapError> {
        let cf = self.cf_handle(CF_SAVED_TX)?;
        self.db.delete_cf(cf, out_point_key(key)).map_err(|err| storage_err!("rocksdb delete_cf saved_tx", err))
    }

    fn put_signed_tx(&self, key: &OutPoint, tx: &Transaction, expires_at: u64) -> Result<(), SwapError> {
        debug!("put_signed_tx key={} tx_hash={} expires_at={}", key, tx.hash(), expires_at);
        self.put_expiring(CF_SIGNED_TX, key, tx, expires_at)
    }

    fn take_signed_tx(&self, key: &OutPoint, now: u64) -> Result<Option<Transaction>, SwapError> {
        let _guard = acquire_with_timeout(&self.record_lock, "take_signed_tx")?;
        let tx = self.get_expiring::<Transaction>(CF_SIGNED_TX, key, now)?;
        if tx.is_some() {
            let cf = self.cf_handle(CF_SIGNED_TX)?;
            self.db.delete_cf(cf, out_point_key(key)).map_err(|err| storage_err!("rocksdb delete_cf signed_tx", err))?;
        }
        Ok(tx)
    }

    fn push_pending_broadcast(&self, pending: &PendingBroadcast) -> Result<(), SwapError> {
        debug!("push_pending_broadcast tx_hash={} cells={}", pending.tx_hash, pending.committed_cells.len());
        let cf = self.cf_handle(CF_PENDING_BROADCAST)?;
        let value = Self::encode(pending)?;
        self.db.put_cf(cf, Self::key_pending(pending), value).map_err(|err| storage_err!("rocksdb put_cf pending_broadcast", err))
    }

    fn pending_broadcasts(&self) -> Result<Vec<PendingBroadcast>, SwapError> {
        self.scan_cf(CF_PENDING_BROADCAST)?.iter().map(|(_, value)| Self::decode(value)).collect()
    }

    fn remove_pending_broadcasts(&self, tx_hashes: &[TxHash]) -> Result<usize, SwapError> {
        if tx_hashes.is_empty() {
            return Ok(0);
        }
        let _guard = acquire_with_timeout(&self.record_lock, "remove_pending_broadcasts")?;
        let cf = self.cf_handle(CF_PENDING_BROADCAST)?;
        let mut batch = WriteBatch::default();
        let mut removed = 0;
        for (key, value) in self.scan_cf(CF_PENDING_BROADCAST)? {
            let pending: PendingBroadcast = Self::decode(&value)?;
            if tx_hashes.contains(&pending.tx_hash) {
                batch.delete_cf(cf, key);
                removed += 1;
            }
        }
        self.db.write(batch).map_err(|err| storage_err!("rocksdb write remove_pending_broadcasts", err))?;
        debug!("remove_pending_broadcasts requested={} removed={}", tx_hashes.len(), removed);
        Ok(removed)
    }

    fn get_cached_cell(&self, out_point: &OutPoint) -> Result<Option<Cell>, SwapError> {
        let cf = self.cf_handle(CF_CELL_CACHE)?;
        match self.db.get_cf(cf, out_point_key(out_point)).map_err(|err| storage_err!("rocksdb get_cf cell_cache", err))? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_cached_cell(&self, cell: &Cell) -> Result<bool, SwapError> {
        let _guard = acquire_with_timeout(&self.record_lock, "put_cached_cell")?;
        let cf = self.cf_handle(CF_CELL_CACHE)?;
        let key = out_point_key(&cell.out_point);
        if self.db.get_pinned_cf(cf, &key).map_err(|err| storage_err!("rocksdb get_cf cell_cache", err))?.is_some() {
            return Ok(false);
        }
        let value = Self::encode(cell)?;
        self.db.put_cf(cf, key, value).map_err(|err| storage_err!("rocksdb put_cf cell_cache", err))?;
        Ok(true)
    }

    fn set_price(&self, udt: &UdtName, price: Decimal) -> Result<(), SwapError> {
        debug!("set_price udt={} price={}", udt, price);
        let cf = self.cf_handle(CF_PRICE)?;
        self.db.put_cf(cf, Self::key_price(udt), price.to_string()).map_err(|err| storage_err!("rocksdb put_cf price", err))
    }

    fn get_price(&self, udt: &UdtName) -> Result<Option<Decimal>, SwapError> {
        let cf = self.cf_handle(CF_PRICE)?;
        let Some(bytes) = self.db.get_cf(cf, Self::key_price(udt)).map_err(|err| storage_err!("rocksdb get_cf price", err))? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&bytes).map_err(|err| storage_err!("decode price", err))?;
        Decimal::from_str(text.trim()).map(Some).map_err(|err| storage_err!("decode price", err))
    }

    fn purge_expired(&self, now: u64) -> Result<usize, SwapError> {
        let _guard = acquire_with_timeout(&self.record_lock, "purge_expired")?;
        let mut batch = WriteBatch::default();
        let purged = self.purge_cf::<SavedTransaction>(CF_SAVED_TX, now, &mut batch)? + self.purge_cf::<Transaction>(CF_SIGNED_TX, now, &mut batch)?;
        self.db.write(batch).map_err(|err| storage_err!("rocksdb write purge_expired", err))?;
        if purged > 0 {
            debug!("purge_expired removed={}", purged);
        }
        Ok(purged)
    }

    fn health_check(&self) -> Result<(), SwapError> {
        self.schema_version()?;
        Ok(())
    }
}
