//! Travel time estimation.
//!
//! The core never talks to a routing service directly. It asks a
//! `TravelEstimator` and gets back either whole minutes or `Unavailable`.
//! Estimators never fail: every problem (empty location, no route, provider
//! error, timeout) collapses into `Unavailable`.

mod chain;
mod routing;
mod table;
mod timeout;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chain::Chain;
pub use routing::RoutingProvider;
pub use table::{TravelRoute, TravelTable};
pub use timeout::Timeout;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Transit,
    Driving,
    Walking,
    Bicycling,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Transit,
        TravelMode::Driving,
        TravelMode::Walking,
        TravelMode::Bicycling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Transit => "transit",
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown travel mode '{}'. Expected one of: {}",
                    s,
                    TravelMode::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}

/// Outcome of a single travel estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelEstimate {
    Minutes(u32),
    Unavailable,
}

impl TravelEstimate {
    /// Unknown travel counts as instant travel. Only used when folding numbers.
    pub fn minutes_or_zero(self) -> u32 {
        match self {
            TravelEstimate::Minutes(m) => m,
            TravelEstimate::Unavailable => 0,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, TravelEstimate::Minutes(_))
    }
}

impl fmt::Display for TravelEstimate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TravelEstimate::Minutes(m) => write!(f, "{} min", m),
            TravelEstimate::Unavailable => f.write_str("unknown"),
        }
    }
}

/// Wraps a routing provider. Must be side-effect free and must not block forever.
#[async_trait]
pub trait TravelEstimator: Send + Sync {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate;
}

#[async_trait]
impl<T: TravelEstimator + ?Sized> TravelEstimator for Arc<T> {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        (**self).estimate(origin, destination, mode).await
    }
}

#[async_trait]
impl<T: TravelEstimator + ?Sized> TravelEstimator for Box<T> {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        (**self).estimate(origin, destination, mode).await
    }
}

pub(crate) fn both_locations_present(origin: &str, destination: &str) -> bool {
    !origin.trim().is_empty() && !destination.trim().is_empty()
}
