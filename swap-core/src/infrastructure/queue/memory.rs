use super::{Job, JobQueue};
use crate::foundation::{Result, SwapError};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// In-process queue on an unbounded tokio channel; one consumer at a time.
pub struct MemoryJobQueue {
    sender: mpsc::UnboundedSender<Job>,
    receiver: Mutex<mpsc::UnboundedReceiver<Job>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver: Mutex::new(receiver) }
    }

    /// Jobs currently waiting.
    pub async fn len(&self) -> usize {
        self.receiver.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<()> {
        self.sender.send(job).map_err(|err| SwapError::QueueError(format!("enqueue {}: receiver closed", err.0.kind.as_str())))
    }

    async fn dequeue(&self) -> Result<Option<Job>> {
        Ok(self.receiver.lock().await.recv().await)
    }
}
