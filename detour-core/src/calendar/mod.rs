//! Calendar ports.
//!
//! `CalendarProvider` is the seam to wherever existing events live. The
//! rescheduler writes through it one event at a time; there is no
//! multi-event transaction.

mod local;
mod remote;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::date_range::DateRange;
use crate::error::DetourResult;
use crate::event::TimedEvent;

pub use local::LocalStore;
pub use remote::RemoteCalendar;

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Events whose start falls within `range`.
    async fn list_events(&self, range: &DateRange) -> DetourResult<Vec<TimedEvent>>;

    /// Store a new event and return the id the provider assigned.
    async fn insert_event(&self, event: &TimedEvent) -> DetourResult<String>;

    /// Move one existing event. Must be atomic for that event.
    async fn update_event(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DetourResult<()>;
}
