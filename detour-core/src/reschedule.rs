//! Cascading rescheduler.
//!
//! Accepting a delay moves the candidate and every same-day event that starts
//! at or after the candidate's original end by the same number of minutes.
//! Each moved event is written back on its own: local drafts are updated in
//! place, calendar events are patched through the provider. A failed write is
//! reported and never rolls back the others.

use chrono::NaiveDateTime;
use futures::future::join_all;
use tracing::{info, warn};

use crate::calendar::{CalendarProvider, LocalStore};
use crate::error::{DetourError, DetourResult};
use crate::event::{EventOrigin, TimedEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedEvent {
    pub id: Option<String>,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub origin: EventOrigin,
}

impl From<&TimedEvent> for ShiftedEvent {
    fn from(event: &TimedEvent) -> Self {
        ShiftedEvent {
            id: event.id.clone(),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            origin: event.origin,
        }
    }
}

/// A downstream event whose new times could not be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleFailure {
    pub event: ShiftedEvent,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescheduleReport {
    pub delay_minutes: u32,
    pub shifted: Vec<ShiftedEvent>,
    pub failed: Vec<RescheduleFailure>,
}

impl RescheduleReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.shifted.is_empty() && self.failed.is_empty()
    }
}

pub struct Rescheduler<'a> {
    local: &'a mut LocalStore,
    calendar: Option<&'a dyn CalendarProvider>,
}

impl<'a> Rescheduler<'a> {
    pub fn new(local: &'a mut LocalStore, calendar: Option<&'a dyn CalendarProvider>) -> Self {
        Rescheduler { local, calendar }
    }

    /// Shift the candidate and everything downstream of it by `delay_minutes`.
    ///
    /// `timeline` is the snapshot of the candidate's day; its entries are
    /// shifted in place. The candidate itself is only moved, not written:
    /// see [`Rescheduler::persist`].
    pub async fn apply_delay(
        &mut self,
        candidate: &mut TimedEvent,
        delay_minutes: u32,
        timeline: &mut [TimedEvent],
    ) -> RescheduleReport {
        let mut report = RescheduleReport {
            delay_minutes,
            ..RescheduleReport::default()
        };
        if delay_minutes == 0 {
            return report;
        }

        // downstream membership is fixed before the candidate moves
        let original_end = candidate.end;
        let date = candidate.date();
        candidate.shift(delay_minutes);

        let mut remote = Vec::new();
        for event in timeline
            .iter_mut()
            .filter(|e| e.is_on(date) && !e.same_identity(candidate) && e.start >= original_end)
        {
            event.shift(delay_minutes);

            match (event.origin, event.id.as_deref()) {
                (EventOrigin::LocallyDrafted, Some(id)) => {
                    match self.local.update(id, event.start, event.end) {
                        Ok(()) => report.shifted.push(ShiftedEvent::from(&*event)),
                        Err(e) => report.failed.push(RescheduleFailure {
                            event: ShiftedEvent::from(&*event),
                            error: e.to_string(),
                        }),
                    }
                }
                // never stored anywhere, moving the snapshot is all there is
                (EventOrigin::LocallyDrafted, None) => {
                    report.shifted.push(ShiftedEvent::from(&*event))
                }
                (EventOrigin::CalendarProvider, _) => remote.push(ShiftedEvent::from(&*event)),
            }
        }

        let calendar = self.calendar;
        let writes = remote.iter().map(|event| write_remote(calendar, event));
        for (event, result) in remote.iter().zip(join_all(writes).await) {
            match result {
                Ok(()) => report.shifted.push(event.clone()),
                Err(e) => {
                    warn!(event = %event.title, error = %e, "could not reschedule event");
                    report.failed.push(RescheduleFailure {
                        event: event.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            candidate = %candidate,
            delay = delay_minutes,
            shifted = report.shifted.len(),
            failed = report.failed.len(),
            "cascade applied"
        );
        report
    }

    /// Re-issue the write for one event that failed during a cascade.
    pub async fn retry(&mut self, failure: &RescheduleFailure) -> DetourResult<()> {
        let event = &failure.event;
        match (event.origin, event.id.as_deref()) {
            (EventOrigin::LocallyDrafted, Some(id)) => {
                self.local.update(id, event.start, event.end)
            }
            (EventOrigin::LocallyDrafted, None) => Ok(()),
            (EventOrigin::CalendarProvider, _) => write_remote(self.calendar, event).await,
        }
    }

    /// Store the candidate where its origin says it belongs.
    ///
    /// Candidates without an id are inserted and receive the new id; a
    /// candidate that already has one is moved to its current times.
    pub async fn persist(&mut self, candidate: &mut TimedEvent) -> DetourResult<String> {
        candidate.validate()?;

        if let Some(id) = candidate.id.clone() {
            match candidate.origin {
                EventOrigin::LocallyDrafted => {
                    self.local.update(&id, candidate.start, candidate.end)?
                }
                EventOrigin::CalendarProvider => {
                    write_remote(self.calendar, &ShiftedEvent::from(&*candidate)).await?
                }
            }
            return Ok(id);
        }

        let id = match candidate.origin {
            EventOrigin::LocallyDrafted => self.local.insert(candidate.clone()),
            EventOrigin::CalendarProvider => {
                let calendar = self.calendar.ok_or(DetourError::NoCalendarConfigured)?;
                calendar.insert_event(candidate).await?
            }
        };
        candidate.id = Some(id.clone());
        info!(candidate = %candidate, id = %id, origin = ?candidate.origin, "candidate persisted");
        Ok(id)
    }
}

async fn write_remote(
    calendar: Option<&dyn CalendarProvider>,
    event: &ShiftedEvent,
) -> DetourResult<()> {
    let calendar = calendar.ok_or(DetourError::NoCalendarConfigured)?;
    let id = event.id.as_deref().ok_or_else(|| DetourError::RescheduleWrite {
        title: event.title.clone(),
        reason: "calendar event has no id".into(),
    })?;
    calendar
        .update_event(id, event.start, event.end)
        .await
        .map_err(|e| DetourError::RescheduleWrite {
            title: event.title.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::DateRange;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// Records updates; refuses ids listed in `broken`.
    #[derive(Default)]
    struct FakeCalendar {
        updates: Mutex<Vec<(String, NaiveDateTime, NaiveDateTime)>>,
        inserted: Mutex<Vec<TimedEvent>>,
        broken: Vec<String>,
    }

    #[async_trait]
    impl CalendarProvider for FakeCalendar {
        async fn list_events(&self, _: &DateRange) -> DetourResult<Vec<TimedEvent>> {
            Ok(Vec::new())
        }

        async fn insert_event(&self, event: &TimedEvent) -> DetourResult<String> {
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push(event.clone());
            Ok(format!("remote-{}", inserted.len()))
        }

        async fn update_event(
            &self,
            id: &str,
            start: NaiveDateTime,
            end: NaiveDateTime,
        ) -> DetourResult<()> {
            if self.broken.iter().any(|b| b == id) {
                return Err(DetourError::Provider("503 backend unavailable".into()));
            }
            self.updates.lock().unwrap().push((id.to_string(), start, end));
            Ok(())
        }
    }

    fn remote(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> TimedEvent {
        TimedEvent::new(id, start, end, "", EventOrigin::CalendarProvider).with_id(id)
    }

    fn candidate() -> TimedEvent {
        TimedEvent::new("Candidate", at(20, 10, 0), at(20, 11, 0), "", EventOrigin::LocallyDrafted)
    }

    #[tokio::test]
    async fn zero_delay_touches_nothing() {
        let mut local = LocalStore::default();
        let calendar = FakeCalendar::default();
        let mut timeline = vec![remote("after", at(20, 12, 0), at(20, 13, 0))];
        let before = timeline.clone();
        let mut cand = candidate();

        let report = Rescheduler::new(&mut local, Some(&calendar))
            .apply_delay(&mut cand, 0, &mut timeline)
            .await;

        assert!(report.is_noop());
        assert_eq!(timeline, before);
        assert_eq!(cand, candidate());
        assert!(calendar.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_events_from_original_end_onward_move() {
        let mut local = LocalStore::default();
        let calendar = FakeCalendar::default();
        let mut timeline = vec![
            remote("earlier", at(20, 8, 0), at(20, 9, 0)),
            remote("overlapping", at(20, 10, 30), at(20, 11, 30)),
            remote("at-end", at(20, 11, 0), at(20, 12, 0)),
            remote("later", at(20, 15, 0), at(20, 16, 0)),
            remote("tomorrow", at(21, 9, 0), at(21, 10, 0)),
        ];
        let mut cand = candidate();

        let report = Rescheduler::new(&mut local, Some(&calendar))
            .apply_delay(&mut cand, 30, &mut timeline)
            .await;

        assert!(report.is_complete());
        assert_eq!((cand.start, cand.end), (at(20, 10, 30), at(20, 11, 30)));
        assert_eq!(timeline[0].start, at(20, 8, 0));
        assert_eq!(timeline[1].start, at(20, 10, 30));
        assert_eq!((timeline[2].start, timeline[2].end), (at(20, 11, 30), at(20, 12, 30)));
        assert_eq!((timeline[3].start, timeline[3].end), (at(20, 15, 30), at(20, 16, 30)));
        assert_eq!(timeline[4].start, at(21, 9, 0));

        let mut updated: Vec<String> = calendar
            .updates
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _, _)| id.clone())
            .collect();
        updated.sort();
        assert_eq!(updated, vec!["at-end", "later"]);
    }

    #[tokio::test]
    async fn local_drafts_are_updated_in_the_store() {
        let mut local = LocalStore::default();
        let id = local.insert(TimedEvent::new(
            "Draft",
            at(20, 13, 0),
            at(20, 14, 0),
            "",
            EventOrigin::LocallyDrafted,
        ));
        let mut timeline = local.events_on(at(20, 0, 0).date());
        let mut cand = candidate();

        let report = Rescheduler::new(&mut local, None)
            .apply_delay(&mut cand, 45, &mut timeline)
            .await;

        assert!(report.is_complete());
        assert_eq!(report.shifted[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(local.events()[0].start, at(20, 13, 45));
    }

    #[tokio::test]
    async fn failed_write_is_reported_without_rolling_back_others() {
        let mut local = LocalStore::default();
        let calendar = FakeCalendar {
            broken: vec!["flaky".into()],
            ..FakeCalendar::default()
        };
        let mut timeline = vec![
            remote("flaky", at(20, 12, 0), at(20, 13, 0)),
            remote("fine", at(20, 14, 0), at(20, 15, 0)),
        ];
        let mut cand = candidate();

        let report = Rescheduler::new(&mut local, Some(&calendar))
            .apply_delay(&mut cand, 20, &mut timeline)
            .await;

        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].event.id.as_deref(), Some("flaky"));
        assert!(report.failed[0].error.contains("503"));
        assert_eq!(report.shifted.len(), 1);
        assert_eq!(calendar.updates.lock().unwrap().len(), 1);
        assert_eq!(timeline[1].start, at(20, 14, 20));
    }

    #[tokio::test]
    async fn failed_write_can_be_retried_individually() {
        let mut local = LocalStore::default();
        let healthy = FakeCalendar::default();
        let failure = RescheduleFailure {
            event: ShiftedEvent::from(&remote("flaky", at(20, 12, 20), at(20, 13, 20))),
            error: "503".into(),
        };

        Rescheduler::new(&mut local, Some(&healthy))
            .retry(&failure)
            .await
            .unwrap();
        assert_eq!(
            healthy.updates.lock().unwrap()[0],
            ("flaky".to_string(), at(20, 12, 20), at(20, 13, 20))
        );
    }

    #[tokio::test]
    async fn calendar_events_without_provider_fail_individually() {
        let mut local = LocalStore::default();
        let mut timeline = vec![remote("orphan", at(20, 12, 0), at(20, 13, 0))];
        let mut cand = candidate();

        let report = Rescheduler::new(&mut local, None)
            .apply_delay(&mut cand, 10, &mut timeline)
            .await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(cand.start, at(20, 10, 10));
    }

    #[tokio::test]
    async fn persist_routes_by_origin() {
        let mut local = LocalStore::default();
        let calendar = FakeCalendar::default();
        let mut rescheduler = Rescheduler::new(&mut local, Some(&calendar));

        let mut draft = candidate();
        let local_id = rescheduler.persist(&mut draft).await.unwrap();
        assert_eq!(draft.id.as_deref(), Some(local_id.as_str()));

        let mut bound = TimedEvent {
            origin: EventOrigin::CalendarProvider,
            ..candidate()
        };
        let remote_id = rescheduler.persist(&mut bound).await.unwrap();
        assert_eq!(remote_id, "remote-1");

        assert_eq!(local.events().len(), 1);
        assert_eq!(calendar.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persist_to_calendar_without_provider_fails() {
        let mut local = LocalStore::default();
        let mut bound = TimedEvent {
            origin: EventOrigin::CalendarProvider,
            ..candidate()
        };
        let err = Rescheduler::new(&mut local, None)
            .persist(&mut bound)
            .await
            .unwrap_err();
        assert!(matches!(err, DetourError::NoCalendarConfigured));
        assert_eq!(bound.id, None);
    }
}
