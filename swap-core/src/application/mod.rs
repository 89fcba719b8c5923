//! Application layer: orchestration across domain logic and infrastructure I/O.

pub mod assembler;
pub mod context;
pub mod funding;
pub mod lifecycle;
pub mod multisig;
pub mod refresher;
pub mod signer_worker;
pub mod swap;

pub use assembler::{Assembler, AssemblyReport};
pub use context::{SwapContext, SwapSettings};
pub use funding::FundPool;
pub use lifecycle::{CompositeObserver, LifecycleObserver, NoopObserver};
pub use multisig::{EndpointSigner, MultisigCoordinator};
pub use refresher::{RefreshReport, Refresher};
pub use signer_worker::SignerWorker;
pub use swap::{ConfirmOutcome, InitiateOutcome, SwapService};
