use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{TravelEstimate, TravelEstimator, TravelMode};

/// Resolves to `Unavailable` when the wrapped estimator exceeds its budget.
pub struct Timeout<E> {
    inner: E,
    budget: Duration,
}

impl<E> Timeout<E> {
    pub fn new(inner: E, budget: Duration) -> Self {
        Timeout { inner, budget }
    }
}

#[async_trait]
impl<E: TravelEstimator> TravelEstimator for Timeout<E> {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        let estimate = self.inner.estimate(origin, destination, mode);
        match tokio::time::timeout(self.budget, estimate).await {
            Ok(estimate) => estimate,
            Err(_) => {
                warn!(
                    origin,
                    destination,
                    budget_ms = self.budget.as_millis() as u64,
                    "travel estimate timed out"
                );
                TravelEstimate::Unavailable
            }
        }
    }
}
