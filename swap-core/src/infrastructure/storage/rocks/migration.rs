use super::schema::*;
use crate::foundation::SwapError;
use rocksdb::{ColumnFamilyDescriptor, Options as RocksOptions, DB};
use std::path::Path;

pub fn open_db_with_cfs(path: impl AsRef<Path>) -> Result<DB, SwapError> {
    let mut options = RocksOptions::default();
    options.create_if_missing(true);
    options.create_missing_column_families(true);
    options.set_use_fsync(true);
    options.set_manual_wal_flush(false);
    options.set_paranoid_checks(true);
    options.optimize_for_point_lookup(64);

    let cfs = ALL_COLUMN_FAMILIES.iter().map(|name| ColumnFamilyDescriptor::new(*name, RocksOptions::default())).collect::<Vec<_>>();

    DB::open_cf_descriptors(&options, path, cfs)
        .map_err(|err| SwapError::StorageError { operation: "rocksdb open_cf_descriptors".to_string(), details: err.to_string() })
}
