//! Origin-neutral event types.
//!
//! Events fetched from a calendar provider and events drafted locally are
//! both represented as a `TimedEvent`. The conflict evaluator and recommender
//! only ever look at times and locations; `origin` matters solely when a
//! rescheduled event is written back.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{DetourError, DetourResult};

/// Where an event lives, and therefore where changes to it are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    /// Fetched from (or destined for) the configured calendar provider
    CalendarProvider,
    /// Kept in the local store only
    #[default]
    LocallyDrafted,
}

/// A scheduled interval in civil time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Unique within its origin. `None` for a candidate that was never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Free text. Empty means "no location", which disables travel estimates.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub origin: EventOrigin,
}

impl TimedEvent {
    pub fn new(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        location: impl Into<String>,
        origin: EventOrigin,
    ) -> Self {
        TimedEvent {
            id: None,
            title: title.into(),
            start,
            end,
            location: location.into(),
            origin,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Calendar date the event starts on. Same-day membership is decided by this.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.date() == date
    }

    pub fn has_location(&self) -> bool {
        !self.location.trim().is_empty()
    }

    /// True when both events carry the same id. Id-less events never match.
    pub fn same_identity(&self, other: &TimedEvent) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b && self.origin == other.origin,
            _ => false,
        }
    }

    /// Move the whole interval forward by `minutes`, keeping its duration.
    pub fn shift(&mut self, minutes: u32) {
        let delta = Duration::minutes(i64::from(minutes));
        self.start += delta;
        self.end += delta;
    }

    /// Reject events that must never reach the conflict evaluator.
    pub fn validate(&self) -> DetourResult<()> {
        if self.title.trim().is_empty() {
            return Err(DetourError::InvalidCandidate("title is empty".into()));
        }
        if self.end <= self.start {
            return Err(DetourError::InvalidCandidate(format!(
                "'{}' ends ({}) at or before it starts ({})",
                self.title, self.end, self.start
            )));
        }
        Ok(())
    }

    /// Human readable time span, e.g. `2025-03-20 10:00-11:30`.
    pub fn render_time(&self) -> String {
        if self.start.date() == self.end.date() {
            format!(
                "{} {}-{}",
                self.start.format("%Y-%m-%d"),
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )
        } else {
            format!(
                "{} - {}",
                self.start.format("%Y-%m-%d %H:%M"),
                self.end.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

impl fmt::Display for TimedEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
