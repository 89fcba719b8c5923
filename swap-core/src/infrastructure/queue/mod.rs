//! Job queue between the swap flows and the signing worker.

mod memory;

pub use memory::MemoryJobQueue;

use crate::domain::ledger::{OutPoint, Transaction};
use crate::foundation::Result;
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Sign and store the result under `target` for `confirm` to pick up.
    Sign { target: OutPoint },
    /// Sign and hand straight to the node.
    SignAndSend,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Sign { .. } => "sign",
            JobKind::SignAndSend => "sign_and_send",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub kind: JobKind,
    pub tx: Transaction,
    /// Unix seconds after which the job is dropped unprocessed.
    pub expires_at: Option<u64>,
}

impl Job {
    pub fn sign(target: OutPoint, tx: Transaction, expires_at: u64) -> Self {
        Self { kind: JobKind::Sign { target }, tx, expires_at: Some(expires_at) }
    }

    pub fn sign_and_send(tx: Transaction) -> Self {
        Self { kind: JobKind::SignAndSend, tx, expires_at: None }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<()>;

    /// Waits for the next job; `None` once the queue is closed.
    async fn dequeue(&self) -> Result<Option<Job>>;
}
