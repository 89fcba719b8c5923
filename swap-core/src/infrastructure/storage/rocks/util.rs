//! Utility helpers for RocksDB-backed storage: bounded locking and key/value codecs.

use super::schema::{KeyBuilder, OUT_POINT_KEY_LEN, SCORE_INDEX_KEY_LEN};
use crate::domain::ledger::OutPoint;
use crate::foundation::{SwapError, TxHash, STORAGE_LOCK_TIMEOUT_SECS};
use crate::storage_err;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

const LOCK_POLL_INTERVAL_MS: u64 = 10;

pub fn acquire_with_timeout<'a, T>(lock: &'a Mutex<T>, operation: &'static str) -> Result<MutexGuard<'a, T>, SwapError> {
    acquire_with_timeout_for(lock, operation, Duration::from_secs(STORAGE_LOCK_TIMEOUT_SECS))
}

pub fn acquire_with_timeout_for<'a, T>(lock: &'a Mutex<T>, operation: &'static str, timeout: Duration) -> Result<MutexGuard<'a, T>, SwapError> {
    let deadline = Instant::now() + timeout;
    loop {
        match lock.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(_)) => return Err(storage_err!(operation, "mutex poisoned")),
            Err(TryLockError::WouldBlock) if Instant::now() >= deadline => {
                return Err(SwapError::StorageLockTimeout { operation: operation.to_string(), timeout_secs: timeout.as_secs() });
            }
            Err(TryLockError::WouldBlock) => std::thread::sleep(Duration::from_millis(LOCK_POLL_INTERVAL_MS)),
        }
    }
}

pub fn out_point_key(out_point: &OutPoint) -> Vec<u8> {
    KeyBuilder::with_capacity(OUT_POINT_KEY_LEN).out_point(out_point).build()
}

pub fn parse_out_point_key(key: &[u8]) -> Result<OutPoint, SwapError> {
    if key.len() != OUT_POINT_KEY_LEN {
        return Err(storage_err!("decode outpoint key", format!("expected {} bytes, got {}", OUT_POINT_KEY_LEN, key.len())));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&key[..32]);
    let mut index = [0u8; 4];
    index.copy_from_slice(&key[32..]);
    Ok(OutPoint::new(TxHash::new(hash), u32::from_be_bytes(index)))
}

pub fn score_index_key(score: u64, out_point: &OutPoint) -> Vec<u8> {
    KeyBuilder::with_capacity(SCORE_INDEX_KEY_LEN).u64_be(score).out_point(out_point).build()
}

pub fn parse_score_index_key(key: &[u8]) -> Result<(u64, OutPoint), SwapError> {
    if key.len() != SCORE_INDEX_KEY_LEN {
        return Err(storage_err!("decode score index key", format!("expected {} bytes, got {}", SCORE_INDEX_KEY_LEN, key.len())));
    }
    Ok((decode_score(&key[..8])?, parse_out_point_key(&key[8..])?))
}

pub fn decode_score(bytes: &[u8]) -> Result<u64, SwapError> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| storage_err!("decode score", "corrupt value"))?;
    Ok(u64::from_be_bytes(array))
}
