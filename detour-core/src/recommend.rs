//! Fold every same-day pair into a single recommendation.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::conflict::{PairKind, PairwiseResult, evaluate_pair};
use crate::constants::{DEFAULT_BUFFER_MINUTES, DEFAULT_ROUNDING_MINUTES};
use crate::error::DetourResult;
use crate::event::TimedEvent;
use crate::travel::{TravelEstimator, TravelMode};

/// Tunables for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    /// Added on top of every computed delay (overlap and travel alike)
    pub buffer_minutes: u32,
    /// Display granularity; 0 or 1 shows the exact figure
    pub rounding_minutes: u32,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy {
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            rounding_minutes: DEFAULT_ROUNDING_MINUTES,
        }
    }
}

impl SchedulePolicy {
    /// Round up to the display granularity. Never rounds down.
    pub fn round_for_display(&self, minutes: u32) -> u32 {
        let step = self.rounding_minutes;
        if step <= 1 || minutes % step == 0 {
            return minutes;
        }
        minutes.saturating_add(step - minutes % step)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Ok,
    Warn,
}

/// One line of the per-event breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub other: TimedEvent,
    pub result: PairwiseResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub status: RecommendationStatus,
    /// Exact delay to apply when rescheduling
    pub required_delay_minutes: u32,
    /// `required_delay_minutes` rounded up for display
    pub display_delay_minutes: u32,
    /// Category that decided the outcome, `None` when everything is safe
    pub kind: Option<PairKind>,
    pub message: String,
    pub pairs: Vec<PairReport>,
}

impl Recommendation {
    pub fn is_ok(&self) -> bool {
        self.status == RecommendationStatus::Ok
    }

    /// The event responsible for the recommended delay, if any.
    pub fn blocking_event(&self) -> Option<&TimedEvent> {
        let kind = self.kind?;
        self.pairs
            .iter()
            .filter(|p| p.result.kind == kind)
            .max_by_key(|p| p.result.required_delay_minutes)
            .map(|p| &p.other)
    }
}

/// Largest delay per category. Overlap dominates travel regardless of size.
pub fn fold(results: &[PairwiseResult]) -> Option<(PairKind, u32)> {
    let max_of = |kind: PairKind| {
        results
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.required_delay_minutes)
            .max()
            .unwrap_or(0)
    };

    let k_overlap = max_of(PairKind::Overlap);
    let k_travel = max_of(PairKind::TravelInfeasible);

    if k_overlap > 0 {
        Some((PairKind::Overlap, k_overlap))
    } else if k_travel > 0 {
        Some((PairKind::TravelInfeasible, k_travel))
    } else {
        None
    }
}

/// Evaluate the candidate against every other event of its day.
///
/// Events on other dates, and the candidate itself, are ignored. Estimator
/// calls for the individual pairs run concurrently.
pub async fn recommend<E>(
    candidate: &TimedEvent,
    same_day_events: &[TimedEvent],
    mode: TravelMode,
    estimator: &E,
    policy: &SchedulePolicy,
) -> DetourResult<Recommendation>
where
    E: TravelEstimator + ?Sized,
{
    candidate.validate()?;

    let others: Vec<&TimedEvent> = same_day_events
        .iter()
        .filter(|e| e.is_on(candidate.date()) && !e.same_identity(candidate))
        .collect();

    if others.is_empty() {
        return Ok(Recommendation {
            status: RecommendationStatus::Ok,
            required_delay_minutes: 0,
            display_delay_minutes: 0,
            kind: None,
            message: "No same-day conflicts".to_string(),
            pairs: Vec::new(),
        });
    }

    let results = join_all(
        others
            .iter()
            .map(|other| evaluate_pair(candidate, other, mode, estimator, policy.buffer_minutes)),
    )
    .await;

    let pairs: Vec<PairReport> = others
        .into_iter()
        .zip(results)
        .map(|(other, result)| PairReport {
            other: other.clone(),
            result,
        })
        .collect();

    let folded = fold(&pairs.iter().map(|p| p.result).collect::<Vec<_>>());

    let mut recommendation = match folded {
        None => Recommendation {
            status: RecommendationStatus::Ok,
            required_delay_minutes: 0,
            display_delay_minutes: 0,
            kind: None,
            message: format!(
                "Fits your day: reachable from all {} other {}",
                pairs.len(),
                if pairs.len() == 1 { "event" } else { "events" }
            ),
            pairs,
        },
        Some((kind, delay)) => Recommendation {
            status: RecommendationStatus::Warn,
            required_delay_minutes: delay,
            display_delay_minutes: policy.round_for_display(delay),
            kind: Some(kind),
            message: String::new(),
            pairs,
        },
    };

    if let Some(kind) = recommendation.kind {
        let with = recommendation
            .blocking_event()
            .map(|e| format!(" with '{}'", e.title))
            .unwrap_or_default();
        let display = recommendation.display_delay_minutes;
        recommendation.message = match kind {
            PairKind::Overlap => format!("Time clash{}: delay by about {} minutes", with, display),
            _ => format!("Travel is too tight{}: delay by about {} minutes", with, display),
        };
    }

    info!(
        candidate = %candidate,
        status = ?recommendation.status,
        delay = recommendation.required_delay_minutes,
        compared = recommendation.pairs.len(),
        "recommendation ready"
    );

    Ok(recommendation)
}
