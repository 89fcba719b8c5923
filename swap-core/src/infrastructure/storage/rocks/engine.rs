//! RocksDB-backed storage engine.
//!
//! # Lock Semantics
//!
//! RocksDB itself is thread-safe, but the pool procedures are read-modify-write sequences across
//! several column families and must be indivisible.
//!
//! - `pool_lock`: guards every `ReservationStore` procedure; each one commits a single `WriteBatch`
//!   while holding it, so a failed procedure writes nothing.
//! - `record_lock`: guards check-then-write record updates (cell cache insert, pending removal,
//!   signed transaction take, purge).
//!
//! Locks are acquired with a bounded timeout (`STORAGE_LOCK_TIMEOUT_SECS`). Cancel procedures also
//! delete records, so `pool_lock` may be held while touching record column families, never the
//! other way around.
//!
//! # Column Families
//!
//! See `schema.rs` for column family names and key layout.

use crate::foundation::SwapError;
use crate::infrastructure::storage::rocks::migration::open_db_with_cfs;
use crate::infrastructure::storage::rocks::schema::*;
use crate::storage_err;
use bincode::Options;
use log::{debug, info, warn};
use rocksdb::{ColumnFamily, IteratorMode, DB};
use std::fs;
use std::path::Path;
use std::sync::Arc;

mod pools;
mod records;

const SCHEMA_VERSION: u32 = 1;
const DB_DIR_NAME: &str = "swap-db";

pub struct RocksStorage {
    db: Arc<DB>,
    pool_lock: std::sync::Mutex<()>,
    record_lock: std::sync::Mutex<()>,
}

impl RocksStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SwapError> {
        Self::open_with_options(path, false)
    }

    pub fn open_with_options(path: impl AsRef<Path>, allow_schema_wipe: bool) -> Result<Self, SwapError> {
        let path = path.as_ref();
        debug!("opening RocksStorage path={}", path.display());
        let db = open_db_with_cfs(path)?;
        let storage = Self { db: Arc::new(db), pool_lock: std::sync::Mutex::new(()), record_lock: std::sync::Mutex::new(()) };
        if let Err(err) = storage.maybe_run_migrations() {
            if allow_schema_wipe {
                if let SwapError::SchemaMismatch { stored, current } = err {
                    warn!("schema mismatch (stored={}, current={}); wiping db path={}", stored, current, path.display());
                    drop(storage);
                    if path.exists() {
                        fs::remove_dir_all(path).map_err(|err| storage_err!("fs::remove_dir_all schema_wipe", err))?;
                    }
                    return Self::open_with_options(path, false);
                }
            }
            return Err(err);
        }
        info!("RocksStorage opened path={}", path.display());
        Ok(storage)
    }

    /// Opens `<data_dir>/swap-db`, creating the directory when missing.
    pub fn open_in_dir_with_options(data_dir: impl AsRef<Path>, allow_schema_wipe: bool) -> Result<Self, SwapError> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir).map_err(|err| storage_err!("fs::create_dir_all open_in_dir", err))?;
        Self::open_with_options(dir.join(DB_DIR_NAME), allow_schema_wipe)
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily, SwapError> {
        self.db.cf_handle(name).ok_or_else(|| SwapError::StorageError {
            operation: "rocksdb cf_handle".to_string(),
            details: format!("missing column family: {}", name),
        })
    }

    fn maybe_run_migrations(&self) -> Result<(), SwapError> {
        match self.schema_version()? {
            None => {
                info!("initializing fresh db schema schema_version={}", SCHEMA_VERSION);
                self.set_schema_version(SCHEMA_VERSION)?;
            }
            Some(v) if v == SCHEMA_VERSION => {}
            Some(v) => return Err(SwapError::SchemaMismatch { stored: v, current: SCHEMA_VERSION }),
        }
        Ok(())
    }

    fn schema_version(&self) -> Result<Option<u32>, SwapError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self.db.get_cf(cf, SCHEMA_VERSION_KEY).map_err(|err| storage_err!("rocksdb get_cf schema_version", err))? {
            Some(bytes) => {
                let array: [u8; 4] = bytes.as_slice().try_into().map_err(|_| SwapError::StorageError {
                    operation: "schema_version decode".to_string(),
                    details: "corrupt schema version".to_string(),
                })?;
                Ok(Some(u32::from_be_bytes(array)))
            }
            None => Ok(None),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), SwapError> {
        let cf = self.cf_handle(CF_METADATA)?;
        self.db.put_cf(cf, SCHEMA_VERSION_KEY, version.to_be_bytes()).map_err(SwapError::from)
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, SwapError> {
        bincode::DefaultOptions::new().with_fixint_encoding().serialize(value).map_err(|err| err.into())
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, SwapError> {
        bincode::DefaultOptions::new().with_fixint_encoding().deserialize(bytes).map_err(|err| err.into())
    }

    /// Every `(key, value)` pair of a column family, in key order.
    fn scan_cf(&self, name: &str) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>, SwapError> {
        let cf = self.cf_handle(name)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| item.map_err(|err| storage_err!(format!("rocksdb iterate {name}"), err)))
            .collect()
    }
}
