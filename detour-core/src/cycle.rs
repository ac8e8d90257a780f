//! One evaluation cycle for a single candidate.
//!
//! ```text
//! Drafted -> Evaluated{Ok|Warn} -> (accept) -> Shifted -> Persisted
//! Drafted -> Evaluated -> Persisted
//! ```
//!
//! The day's timeline is snapshotted once, during evaluation, and reused for
//! the cascade. Nothing leaves `Persisted`; a changed candidate starts a new
//! cycle.

use tracing::info;

use crate::calendar::{CalendarProvider, LocalStore};
use crate::date_range::DateRange;
use crate::error::{DetourError, DetourResult};
use crate::event::TimedEvent;
use crate::recommend::{Recommendation, SchedulePolicy, recommend};
use crate::reschedule::{RescheduleReport, Rescheduler};
use crate::travel::{TravelEstimator, TravelMode};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleState {
    Drafted,
    Evaluated(Recommendation),
    Shifted {
        recommendation: Recommendation,
        report: RescheduleReport,
    },
    Persisted {
        id: String,
    },
}

impl CycleState {
    pub fn name(&self) -> &'static str {
        match self {
            CycleState::Drafted => "drafted",
            CycleState::Evaluated(_) => "evaluated",
            CycleState::Shifted { .. } => "shifted",
            CycleState::Persisted { .. } => "persisted",
        }
    }
}

pub struct Cycle {
    candidate: TimedEvent,
    mode: TravelMode,
    timeline: Vec<TimedEvent>,
    state: CycleState,
}

impl Cycle {
    /// Start a cycle. Invalid candidates are rejected here.
    pub fn draft(candidate: TimedEvent, mode: TravelMode) -> DetourResult<Self> {
        candidate.validate()?;
        Ok(Cycle {
            candidate,
            mode,
            timeline: Vec::new(),
            state: CycleState::Drafted,
        })
    }

    pub fn candidate(&self) -> &TimedEvent {
        &self.candidate
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> DetourError {
        DetourError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Snapshot the candidate's day from both sources and evaluate against it.
    ///
    /// A calendar read failure aborts the cycle: an incomplete timeline would
    /// make any recommendation unsound.
    pub async fn evaluate<E>(
        &mut self,
        local: &LocalStore,
        calendar: Option<&dyn CalendarProvider>,
        estimator: &E,
        policy: &SchedulePolicy,
    ) -> DetourResult<Recommendation>
    where
        E: TravelEstimator + ?Sized,
    {
        if !matches!(self.state, CycleState::Drafted) {
            return Err(self.invalid("evaluate"));
        }

        let date = self.candidate.date();
        let mut timeline = local.events_on(date);
        if let Some(calendar) = calendar {
            let remote = calendar.list_events(&DateRange::day(date)).await?;
            timeline.extend(remote.into_iter().filter(|e| e.is_on(date)));
        }
        timeline.sort_by_key(|e| e.start);

        let recommendation =
            recommend(&self.candidate, &timeline, self.mode, estimator, policy).await?;

        self.timeline = timeline;
        self.state = CycleState::Evaluated(recommendation.clone());
        Ok(recommendation)
    }

    /// Apply the recommended delay to the candidate and everything downstream.
    pub async fn accept(
        &mut self,
        rescheduler: &mut Rescheduler<'_>,
    ) -> DetourResult<RescheduleReport> {
        let recommendation = match &self.state {
            CycleState::Evaluated(r) => r.clone(),
            _ => return Err(self.invalid("accept")),
        };

        let report = rescheduler
            .apply_delay(
                &mut self.candidate,
                recommendation.required_delay_minutes,
                &mut self.timeline,
            )
            .await;

        self.state = CycleState::Shifted {
            recommendation,
            report: report.clone(),
        };
        Ok(report)
    }

    /// Store the candidate, shifted or not.
    pub async fn persist(&mut self, rescheduler: &mut Rescheduler<'_>) -> DetourResult<String> {
        if !matches!(
            self.state,
            CycleState::Evaluated(_) | CycleState::Shifted { .. }
        ) {
            return Err(self.invalid("persist"));
        }

        let id = rescheduler.persist(&mut self.candidate).await?;
        info!(candidate = %self.candidate, id = %id, "cycle complete");
        self.state = CycleState::Persisted { id: id.clone() };
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventOrigin;
    use crate::travel::TravelTable;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn candidate() -> TimedEvent {
        TimedEvent::new("Candidate", at(10, 0), at(11, 0), "", EventOrigin::LocallyDrafted)
    }

    #[test]
    fn draft_rejects_invalid_candidate() {
        let broken =
            TimedEvent::new("Candidate", at(11, 0), at(10, 0), "", EventOrigin::LocallyDrafted);
        assert!(matches!(
            Cycle::draft(broken, TravelMode::Transit),
            Err(DetourError::InvalidCandidate(_))
        ));
    }

    #[tokio::test]
    async fn cannot_accept_before_evaluating() {
        let mut local = LocalStore::default();
        let mut cycle = Cycle::draft(candidate(), TravelMode::Transit).unwrap();
        let mut rescheduler = Rescheduler::new(&mut local, None);

        let err = cycle.accept(&mut rescheduler).await.unwrap_err();
        assert!(matches!(
            err,
            DetourError::InvalidTransition { action: "accept", state: "drafted" }
        ));
        assert!(cycle.persist(&mut rescheduler).await.is_err());
    }

    #[tokio::test]
    async fn ok_cycle_goes_straight_to_persisted() {
        let mut local = LocalStore::default();
        let mut cycle = Cycle::draft(candidate(), TravelMode::Walking).unwrap();

        let rec = cycle
            .evaluate(&local, None, &TravelTable::default(), &SchedulePolicy::default())
            .await
            .unwrap();
        assert!(rec.is_ok());

        let mut rescheduler = Rescheduler::new(&mut local, None);
        let id = cycle.persist(&mut rescheduler).await.unwrap();
        assert_eq!(cycle.state(), &CycleState::Persisted { id: id.clone() });
        assert_eq!(local.events().len(), 1);
    }

    #[tokio::test]
    async fn persisted_cycle_is_final() {
        let mut local = LocalStore::default();
        let mut cycle = Cycle::draft(candidate(), TravelMode::Walking).unwrap();
        cycle
            .evaluate(&local, None, &TravelTable::default(), &SchedulePolicy::default())
            .await
            .unwrap();

        let mut rescheduler = Rescheduler::new(&mut local, None);
        cycle.persist(&mut rescheduler).await.unwrap();
        assert!(cycle.accept(&mut rescheduler).await.is_err());
        assert!(cycle.persist(&mut rescheduler).await.is_err());
        drop(rescheduler);

        let err = cycle
            .evaluate(&local, None, &TravelTable::default(), &SchedulePolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DetourError::InvalidTransition { state: "persisted", .. }
        ));
    }
}
