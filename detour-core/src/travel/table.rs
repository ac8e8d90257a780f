//! Static travel times from the `[[travel]]` section of the config file.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{TravelEstimate, TravelEstimator, TravelMode, both_locations_present};

/// One row of the travel table. Applies to every mode unless `mode` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRoute {
    pub from: String,
    pub to: String,
    pub minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TravelMode>,
}

impl TravelRoute {
    pub fn new(from: &str, to: &str, minutes: u32) -> Self {
        TravelRoute {
            from: from.to_string(),
            to: to.to_string(),
            minutes,
            mode: None,
        }
    }

    pub fn for_mode(mut self, mode: TravelMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

type RouteKey = (String, String, Option<TravelMode>);

/// Symmetric lookup table: A→B and B→A share one entry.
#[derive(Debug, Clone, Default)]
pub struct TravelTable {
    routes: HashMap<RouteKey, u32>,
}

fn normalize(location: &str) -> String {
    location.trim().to_lowercase()
}

fn key(a: &str, b: &str, mode: Option<TravelMode>) -> RouteKey {
    let (a, b) = (normalize(a), normalize(b));
    if a <= b { (a, b, mode) } else { (b, a, mode) }
}

impl TravelTable {
    pub fn new(routes: Vec<TravelRoute>) -> Self {
        let routes = routes
            .into_iter()
            .map(|r| (key(&r.from, &r.to, r.mode), r.minutes))
            .collect();
        TravelTable { routes }
    }

    pub fn lookup(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        if !both_locations_present(origin, destination) {
            return TravelEstimate::Unavailable;
        }
        if normalize(origin) == normalize(destination) {
            return TravelEstimate::Minutes(0);
        }

        self.routes
            .get(&key(origin, destination, Some(mode)))
            .or_else(|| self.routes.get(&key(origin, destination, None)))
            .map(|m| TravelEstimate::Minutes(*m))
            .unwrap_or(TravelEstimate::Unavailable)
    }
}

#[async_trait]
impl TravelEstimator for TravelTable {
    async fn estimate(&self, origin: &str, destination: &str, mode: TravelMode) -> TravelEstimate {
        self.lookup(origin, destination, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TravelTable {
        TravelTable::new(vec![
            TravelRoute::new("Seoul Station", "Gangnam", 35),
            TravelRoute::new("Seoul Station", "Gangnam", 25).for_mode(TravelMode::Driving),
        ])
    }

    #[test]
    fn lookup_is_symmetric_and_case_insensitive() {
        let t = table();
        assert_eq!(
            t.lookup("seoul station", "GANGNAM", TravelMode::Transit),
            TravelEstimate::Minutes(35)
        );
        assert_eq!(
            t.lookup("Gangnam", "Seoul Station", TravelMode::Walking),
            TravelEstimate::Minutes(35)
        );
    }

    #[test]
    fn mode_specific_row_wins() {
        assert_eq!(
            table().lookup("Gangnam", "Seoul Station", TravelMode::Driving),
            TravelEstimate::Minutes(25)
        );
    }

    #[test]
    fn same_place_takes_no_time() {
        assert_eq!(
            table().lookup("Itaewon", " itaewon ", TravelMode::Walking),
            TravelEstimate::Minutes(0)
        );
    }

    #[test]
    fn empty_or_unknown_locations_are_unavailable() {
        let t = table();
        assert_eq!(t.lookup("", "Gangnam", TravelMode::Transit), TravelEstimate::Unavailable);
        assert_eq!(t.lookup("Busan", "Gangnam", TravelMode::Transit), TravelEstimate::Unavailable);
    }
}
