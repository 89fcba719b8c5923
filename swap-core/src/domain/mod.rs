pub mod assembly;
pub mod ledger;
pub mod multisig;
pub mod pricing;
pub mod reservation;
pub mod swap;
