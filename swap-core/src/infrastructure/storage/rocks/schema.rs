use crate::domain::ledger::OutPoint;

/// Helper to build storage keys consistently.
pub struct KeyBuilder {
    buf: Vec<u8>,
}

impl KeyBuilder {
    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap) }
    }

    pub fn prefix(mut self, prefix: &[u8]) -> Self {
        self.buf.extend_from_slice(prefix);
        self
    }

    pub fn str(mut self, value: &str) -> Self {
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn u64_be(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Outpoint as tx hash followed by the big-endian index, so byte order equals `OutPoint` order.
    pub fn out_point(mut self, value: &OutPoint) -> Self {
        self.buf.extend_from_slice(value.tx_hash.as_hash());
        self.buf.extend_from_slice(&value.index.to_be_bytes());
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

pub const OUT_POINT_KEY_LEN: usize = 32 + 4;
pub const SCORE_INDEX_KEY_LEN: usize = 8 + OUT_POINT_KEY_LEN;
pub const PRICE_KEY_PREFIX: &[u8] = b"PRICE:";
pub const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub const CF_METADATA: &str = "metadata";
pub const CF_DEFAULT: &str = "default";
/// outpoint -> first-seen score.
pub const CF_POOL_LIVE: &str = "pool_live";
/// score ++ outpoint -> (), ordered view of `CF_POOL_LIVE` for `lock_cell`.
pub const CF_POOL_LIVE_BY_SCORE: &str = "pool_live_by_score";
/// outpoint -> expiry.
pub const CF_POOL_LOCKED: &str = "pool_locked";
/// outpoint -> expiry.
pub const CF_POOL_COMMITTING: &str = "pool_committing";
pub const CF_SAVED_TX: &str = "saved_tx";
pub const CF_SIGNED_TX: &str = "signed_tx";
/// submitted_at ++ tx hash -> pending broadcast.
pub const CF_PENDING_BROADCAST: &str = "pending_broadcast";
pub const CF_CELL_CACHE: &str = "cell_cache";
pub const CF_PRICE: &str = "price";

pub const ALL_COLUMN_FAMILIES: &[&str] = &[
    CF_DEFAULT,
    CF_METADATA,
    CF_POOL_LIVE,
    CF_POOL_LIVE_BY_SCORE,
    CF_POOL_LOCKED,
    CF_POOL_COMMITTING,
    CF_SAVED_TX,
    CF_SIGNED_TX,
    CF_PENDING_BROADCAST,
    CF_CELL_CACHE,
    CF_PRICE,
];
