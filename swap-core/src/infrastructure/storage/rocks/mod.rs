//! RocksDB-backed storage implementation.
//!
//! `RocksStorage` is the persistent implementation of:
//! - `Storage` (saved/signed transactions, pending broadcasts, cell cache, prices)
//! - `ReservationStore` (LIVE / LOCKED / COMMITTING pools)
//!
//! See `engine.rs` for lock semantics and the main implementation.

pub mod engine;
pub mod migration;
pub mod schema;
pub mod util;

pub use engine::RocksStorage;
