//! Travel estimates from an external routing provider binary.

use async_trait::async_trait;
use tracing::debug;

use super::{TravelEstimate, TravelEstimator, TravelMode, both_locations_present};
use crate::protocol::{EstimateTravel, TravelDuration};
use crate::provider::Provider;

pub struct RoutingProvider {
    provider: Provider,
    provider_config: serde_json::Map<String, serde_json::Value>,
}

impl RoutingProvider {
    pub fn new(
        provider: Provider,
        provider_config: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        RoutingProvider {
            provider,
            provider_config,
        }
    }
}

#[async_trait]
impl TravelEstimator for RoutingProvider {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        if !both_locations_present(origin, destination) {
            return TravelEstimate::Unavailable;
        }

        let result = self
            .provider
            .call(EstimateTravel {
                provider_config: self.provider_config.clone(),
                origin: origin.to_string(),
                destination: destination.to_string(),
                mode,
            })
            .await;

        match result {
            Ok(TravelDuration { minutes: Some(m) }) => TravelEstimate::Minutes(m),
            Ok(TravelDuration { minutes: None }) => {
                debug!(origin, destination, %mode, "routing provider found no route");
                TravelEstimate::Unavailable
            }
            Err(e) => {
                debug!(
                    provider = self.provider.binary_name(),
                    error = %e,
                    "routing provider failed, treating travel as unknown"
                );
                TravelEstimate::Unavailable
            }
        }
    }
}
