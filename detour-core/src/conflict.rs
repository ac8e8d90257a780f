//! Pairwise conflict evaluation.
//!
//! Given the candidate and one other event, decide whether the two overlap,
//! whether there is not enough time to travel between them, or whether they
//! are safe, and how many minutes the candidate must move to make them safe.
//!
//! Time differences are taken in seconds and converted to minutes only at the
//! end, rounding up, so a required delay is never understated.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::TimedEvent;
use crate::travel::{TravelEstimate, TravelEstimator, TravelMode, both_locations_present};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// The two intervals intersect
    Overlap,
    /// Disjoint, but the gap does not leave room for travel
    TravelInfeasible,
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseResult {
    pub kind: PairKind,
    pub required_delay_minutes: u32,
    /// Travel estimate that fed the decision, `None` if none was needed.
    #[serde(skip)]
    pub travel: Option<TravelEstimate>,
}

impl PairwiseResult {
    pub fn safe() -> Self {
        PairwiseResult {
            kind: PairKind::Safe,
            required_delay_minutes: 0,
            travel: None,
        }
    }

    pub fn is_safe(&self) -> bool {
        self.kind == PairKind::Safe
    }
}

/// How the pair is laid out in time, before any travel is considered.
enum Layout<'a> {
    CrossDay,
    Overlap { seconds: i64 },
    Disjoint { first: &'a TimedEvent, second: &'a TimedEvent, gap_seconds: i64 },
}

fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds()
}

/// Ceiling of `seconds / 60`, clamped at zero.
fn ceil_minutes(seconds: i64) -> u32 {
    if seconds <= 0 {
        return 0;
    }
    u32::try_from((seconds + 59) / 60).unwrap_or(u32::MAX)
}

fn layout<'a>(candidate: &'a TimedEvent, other: &'a TimedEvent) -> Layout<'a> {
    if candidate.date() != other.date() {
        return Layout::CrossDay;
    }

    if candidate.start < other.end && other.start < candidate.end {
        let seconds = seconds_between(
            candidate.start.max(other.start),
            candidate.end.min(other.end),
        );
        return Layout::Overlap { seconds };
    }

    let (first, second) = if candidate.end <= other.start {
        (candidate, other)
    } else {
        (other, candidate)
    };
    Layout::Disjoint {
        first,
        second,
        gap_seconds: seconds_between(first.end, second.start),
    }
}

/// Classify a pair given an already-resolved travel estimate.
///
/// For overlapping pairs `travel` is candidate → other; for disjoint pairs
/// it is from whichever event ends first to the one that follows.
pub fn classify(
    candidate: &TimedEvent,
    other: &TimedEvent,
    travel: TravelEstimate,
    buffer_minutes: u32,
) -> PairwiseResult {
    let buffer_seconds = i64::from(buffer_minutes) * 60;
    let travel_seconds = i64::from(travel.minutes_or_zero()) * 60;

    match layout(candidate, other) {
        Layout::CrossDay => PairwiseResult::safe(),
        Layout::Overlap { seconds } => PairwiseResult {
            kind: PairKind::Overlap,
            required_delay_minutes: ceil_minutes(seconds + travel_seconds + buffer_seconds),
            travel: Some(travel),
        },
        Layout::Disjoint { gap_seconds, .. } => {
            if gap_seconds - travel_seconds > 0 {
                PairwiseResult {
                    travel: Some(travel),
                    ..PairwiseResult::safe()
                }
            } else {
                PairwiseResult {
                    kind: PairKind::TravelInfeasible,
                    required_delay_minutes: ceil_minutes(
                        travel_seconds - gap_seconds + buffer_seconds,
                    ),
                    travel: Some(travel),
                }
            }
        }
    }
}

/// Evaluate the candidate against one other event.
///
/// Makes at most one estimator call; cross-day pairs make none.
pub async fn evaluate_pair<E>(
    candidate: &TimedEvent,
    other: &TimedEvent,
    mode: TravelMode,
    estimator: &E,
    buffer_minutes: u32,
) -> PairwiseResult
where
    E: TravelEstimator + ?Sized,
{
    let (origin, destination) = match layout(candidate, other) {
        Layout::CrossDay => return PairwiseResult::safe(),
        Layout::Overlap { .. } => (candidate.location.as_str(), other.location.as_str()),
        Layout::Disjoint { first, second, .. } => {
            (first.location.as_str(), second.location.as_str())
        }
    };

    let travel = if both_locations_present(origin, destination) {
        estimator.estimate(origin, destination, mode).await
    } else {
        TravelEstimate::Unavailable
    };

    let result = classify(candidate, other, travel, buffer_minutes);
    debug!(
        candidate = %candidate,
        other = %other,
        kind = ?result.kind,
        travel = %travel,
        delay = result.required_delay_minutes,
        "evaluated pair"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventOrigin;
    use crate::travel::{TravelRoute, TravelTable};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BUFFER: u32 = 30;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn event(title: &str, start: NaiveDateTime, end: NaiveDateTime, location: &str) -> TimedEvent {
        TimedEvent::new(title, start, end, location, EventOrigin::CalendarProvider)
    }

    struct NeverKnows;

    #[async_trait]
    impl TravelEstimator for NeverKnows {
        async fn estimate(&self, _: &str, _: &str, _: TravelMode) -> TravelEstimate {
            TravelEstimate::Unavailable
        }
    }

    struct Counting(AtomicUsize);

    #[async_trait]
    impl TravelEstimator for Counting {
        async fn estimate(&self, _: &str, _: &str, _: TravelMode) -> TravelEstimate {
            self.0.fetch_add(1, Ordering::SeqCst);
            TravelEstimate::Minutes(90)
        }
    }

    #[tokio::test]
    async fn cross_day_pairs_are_always_safe() {
        let candidate = event("Late dinner", at(20, 23, 0), at(21, 1, 0), "Hongdae");
        let other = event("Breakfast", at(21, 0, 30), at(21, 1, 30), "Jamsil");
        let counting = Counting(AtomicUsize::new(0));

        let result =
            evaluate_pair(&candidate, &other, TravelMode::Transit, &counting, BUFFER).await;
        assert_eq!(result, PairwiseResult::safe());
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn overlap_delay_adds_overlap_travel_and_buffer() {
        let candidate = event("Client visit", at(20, 10, 0), at(20, 11, 0), "Seoul Station");
        let other = event("Team sync", at(20, 10, 30), at(20, 11, 30), "Gangnam");
        let table = TravelTable::new(vec![TravelRoute::new("Seoul Station", "Gangnam", 15)]);

        let result = evaluate_pair(&candidate, &other, TravelMode::Transit, &table, BUFFER).await;
        assert_eq!(result.kind, PairKind::Overlap);
        assert_eq!(result.required_delay_minutes, 30 + 15 + 30);
    }

    #[tokio::test]
    async fn tight_gap_is_travel_infeasible() {
        let other = event("Gym", at(20, 8, 0), at(20, 9, 0), "Mapo");
        let candidate = event("Coffee", at(20, 9, 10), at(20, 10, 0), "Yeouido");
        let table = TravelTable::new(vec![TravelRoute::new("Mapo", "Yeouido", 20)]);

        let result = evaluate_pair(&candidate, &other, TravelMode::Transit, &table, BUFFER).await;
        assert_eq!(result.kind, PairKind::TravelInfeasible);
        assert_eq!(result.required_delay_minutes, (20 - 10) + 30);
    }

    #[tokio::test]
    async fn gap_with_slack_is_safe() {
        let other = event("Gym", at(20, 8, 0), at(20, 9, 0), "Mapo");
        let candidate = event("Coffee", at(20, 9, 40), at(20, 10, 30), "Yeouido");
        let table = TravelTable::new(vec![TravelRoute::new("Mapo", "Yeouido", 20)]);

        let result = evaluate_pair(&candidate, &other, TravelMode::Transit, &table, BUFFER).await;
        assert!(result.is_safe());
        assert_eq!(result.required_delay_minutes, 0);
    }

    #[test]
    fn gap_exactly_equal_to_travel_is_not_enough() {
        let candidate = event("A", at(20, 9, 0), at(20, 10, 0), "X");
        let other = event("B", at(20, 10, 20), at(20, 11, 0), "Y");

        let result = classify(&candidate, &other, TravelEstimate::Minutes(20), BUFFER);
        assert_eq!(result.kind, PairKind::TravelInfeasible);
        assert_eq!(result.required_delay_minutes, BUFFER);
    }

    #[test]
    fn back_to_back_without_travel_data_is_infeasible() {
        // zero gap leaves no positive slack even with zero travel
        let candidate = event("A", at(20, 9, 0), at(20, 10, 0), "");
        let other = event("B", at(20, 10, 0), at(20, 11, 0), "");

        let result = classify(&candidate, &other, TravelEstimate::Unavailable, BUFFER);
        assert_eq!(result.kind, PairKind::TravelInfeasible);
        assert_eq!(result.required_delay_minutes, BUFFER);
    }

    #[tokio::test]
    async fn unavailable_routing_still_detects_overlap() {
        let candidate = event("A", at(20, 10, 0), at(20, 11, 0), "Seoul Station");
        let other = event("B", at(20, 10, 45), at(20, 12, 0), "Gangnam");

        let result =
            evaluate_pair(&candidate, &other, TravelMode::Driving, &NeverKnows, BUFFER).await;
        assert_eq!(result.kind, PairKind::Overlap);
        assert_eq!(result.required_delay_minutes, 15 + BUFFER);
    }

    #[tokio::test]
    async fn unavailable_routing_makes_positive_gaps_safe() {
        let candidate = event("A", at(20, 10, 0), at(20, 11, 0), "Seoul Station");
        let other = event("B", at(20, 11, 1), at(20, 12, 0), "Busan");

        let result =
            evaluate_pair(&candidate, &other, TravelMode::Driving, &NeverKnows, BUFFER).await;
        assert!(result.is_safe());
        assert_eq!(result.travel, Some(TravelEstimate::Unavailable));
    }

    #[test]
    fn other_event_first_uses_its_end_for_the_gap() {
        let candidate = event("Later", at(20, 14, 0), at(20, 15, 0), "B");
        let other = event("Earlier", at(20, 12, 0), at(20, 13, 50), "A");

        let result = classify(&candidate, &other, TravelEstimate::Minutes(25), BUFFER);
        assert_eq!(result.kind, PairKind::TravelInfeasible);
        assert_eq!(result.required_delay_minutes, (25 - 10) + BUFFER);
    }

    #[test]
    fn partial_minutes_round_up() {
        let start = at(20, 10, 0);
        let candidate = event("A", start, at(20, 11, 0), "");
        let other = event(
            "B",
            at(20, 10, 59) + chrono::Duration::seconds(30),
            at(20, 12, 0),
            "",
        );

        let result = classify(&candidate, &other, TravelEstimate::Unavailable, 0);
        assert_eq!(result.kind, PairKind::Overlap);
        assert_eq!(result.required_delay_minutes, 1);
    }

    #[test]
    fn buffer_is_configurable() {
        let candidate = event("A", at(20, 10, 0), at(20, 11, 0), "");
        let other = event("B", at(20, 10, 30), at(20, 11, 30), "");

        let result = classify(&candidate, &other, TravelEstimate::Unavailable, 60);
        assert_eq!(result.required_delay_minutes, 30 + 60);
    }
}
