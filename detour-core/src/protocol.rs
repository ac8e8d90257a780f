//! Defines the JSON protocol used for communication between detour
//! and provider binaries over stdin/stdout.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::date_range::{from_zoned_rfc3339, to_zoned_rfc3339};
use crate::error::DetourResult;
use crate::event::{EventOrigin, TimedEvent};
use crate::travel::TravelMode;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    InsertEvent,
    UpdateEvent,
    EstimateTravel,
}

/// Request sent from detour to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider back to detour.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// Event as exchanged with calendar providers: zoned RFC 3339 times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl WireEvent {
    pub fn from_event(event: &TimedEvent, tz: Tz) -> DetourResult<Self> {
        Ok(WireEvent {
            id: event.id.clone(),
            title: event.title.clone(),
            start: to_zoned_rfc3339(event.start, tz)?,
            end: to_zoned_rfc3339(event.end, tz)?,
            location: event.has_location().then(|| event.location.clone()),
        })
    }

    pub fn into_event(self, tz: Tz) -> DetourResult<TimedEvent> {
        Ok(TimedEvent {
            id: self.id,
            title: self.title,
            start: from_zoned_rfc3339(&self.start, tz)?,
            end: from_zoned_rfc3339(&self.end, tz)?,
            location: self.location.unwrap_or_default(),
            origin: EventOrigin::CalendarProvider,
        })
    }
}

/// List events within a time range.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    /// Provider-specific config (e.g., account, calendar id)
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<WireEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Insert a new event. The provider answers with the id it assigned.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertEvent {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub event: WireEvent,
}

impl ProviderCommand for InsertEvent {
    type Response = String;
    fn command() -> Command {
        Command::InsertEvent
    }
}

/// Move an existing event to a new start/end.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
    pub start: String,
    pub end: String,
}

impl ProviderCommand for UpdateEvent {
    type Response = ();
    fn command() -> Command {
        Command::UpdateEvent
    }
}

/// Ask a routing provider how long it takes to get from one place to another.
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimateTravel {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelDuration {
    /// `None` when the provider could not find a route
    pub minutes: Option<u32>,
}

impl ProviderCommand for EstimateTravel {
    type Response = TravelDuration;
    fn command() -> Command {
        Command::EstimateTravel
    }
}
