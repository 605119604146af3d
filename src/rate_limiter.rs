use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Runs hosting API calls one at a time, with at least `min_interval`
/// between the start of consecutive calls.
///
/// The slot is a fair `tokio::sync::Mutex`, so waiters are served in FIFO
/// order. The guard is held for the whole task, which keeps calls from
/// overlapping. A failing task simply returns its error; nothing is retried.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    pub async fn schedule<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut slot = self.last_start.lock().await;

        if let Some(previous) = *slot {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                debug!("Rate limiter holding request for {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }

        *slot = Some(Instant::now());
        task().await
    }
}
