pub mod multisig_args;
pub mod pool_status;
