use async_trait::async_trait;

use super::{TravelEstimate, TravelEstimator, TravelMode};

/// Asks each estimator in turn and returns the first actual estimate.
pub struct Chain {
    estimators: Vec<Box<dyn TravelEstimator>>,
}

impl Chain {
    pub fn new(estimators: Vec<Box<dyn TravelEstimator>>) -> Self {
        Chain { estimators }
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }
}

#[async_trait]
impl TravelEstimator for Chain {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        for estimator in &self.estimators {
            let estimate = estimator.estimate(origin, destination, mode).await;
            if estimate.is_available() {
                return estimate;
            }
        }
        TravelEstimate::Unavailable
    }
}
