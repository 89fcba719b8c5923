//! Custom r-of-m multisig structure: validation, lock args and witness placeholder.

pub mod config;
pub mod script;

pub use config::{MultisigConfig, MultisigConfigInput};
pub use script::{fill_signatures, multisig_args, multisig_script, witness_lock_placeholder};
