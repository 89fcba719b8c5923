//! Infrastructure layer: I/O and external integrations.

pub mod chain;
pub mod config;
pub mod logging;
pub mod price;
pub mod queue;
pub mod rpc;
pub mod signing;
pub mod storage;
