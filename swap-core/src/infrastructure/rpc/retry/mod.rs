use crate::foundation::SwapError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with fixed delay/backoff.
pub async fn retry<F, Fut, T>(mut attempts: usize, delay: Duration, mut op: F) -> Result<T, SwapError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SwapError>>,
{
    let mut last_err = None;
    while attempts > 0 {
        match op().await {
            Ok(v) => return Ok(v),
            Err(err) => {
                last_err = Some(err);
                attempts -= 1;
                if attempts > 0 {
                    sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| SwapError::Message("retry exhausted".to_string())))
}

/// Doubling delay between polls, capped at `max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max: max.max(initial) }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Polls `op` until it yields `Some`, sleeping per `policy` between attempts.
///
/// Has no deadline of its own; callers bound it with `tokio::time::timeout`.
pub async fn poll_with_backoff<F, Fut, T>(policy: BackoffPolicy, mut op: F) -> Result<T, SwapError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, SwapError>>,
{
    let mut attempt = 0u32;
    loop {
        if let Some(value) = op().await? {
            return Ok(value);
        }
        sleep(policy.delay(attempt)).await;
        attempt = attempt.saturating_add(1);
    }
}
