use std::future::Future;

use tokio::time::Instant;

/// A scorer's value together with how long it took to produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricResult<T> {
    pub value: T,
    pub latency_seconds: f64,
}

impl<T> MetricResult<T> {
    /// Folds time spent on shared upstream work into this metric's latency.
    pub fn with_added_latency(mut self, seconds: f64) -> Self {
        self.latency_seconds += seconds;
        self
    }
}

impl<T, E> MetricResult<Result<T, E>> {
    pub fn transpose(self) -> Result<MetricResult<T>, E> {
        let latency_seconds = self.latency_seconds;
        self.value.map(|value| MetricResult { value, latency_seconds })
    }
}

/// Awaits `work` and records its wall-clock duration in seconds.
pub async fn measure<F, T>(work: F) -> MetricResult<T>
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let value = work.await;
    MetricResult {
        value,
        latency_seconds: start.elapsed().as_secs_f64(),
    }
}
