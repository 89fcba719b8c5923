pub mod health;
pub mod rpc;
pub mod sign;
pub mod swap;
pub mod types;
