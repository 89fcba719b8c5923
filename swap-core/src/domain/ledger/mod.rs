//! Cell/transaction model, its molecule encoding and the hashing/signing rules built on it.

pub mod fee;
pub mod hash;
pub mod json;
pub mod molecule;
pub mod sighash;
pub mod signature;
pub mod types;
pub mod udt;

pub use types::*;
