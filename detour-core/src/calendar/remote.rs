//! Calendar operations via a provider binary.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use chrono_tz::Tz;

use super::CalendarProvider;
use crate::date_range::{DateRange, to_zoned_rfc3339};
use crate::error::DetourResult;
use crate::event::TimedEvent;
use crate::protocol::{InsertEvent, ListEvents, UpdateEvent, WireEvent};
use crate::provider::Provider;

pub struct RemoteCalendar {
    provider: Provider,
    provider_config: serde_json::Map<String, serde_json::Value>,
    tz: Tz,
}

impl RemoteCalendar {
    pub fn new(
        provider: Provider,
        provider_config: serde_json::Map<String, serde_json::Value>,
        tz: Tz,
    ) -> Self {
        RemoteCalendar {
            provider,
            provider_config,
            tz,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

#[async_trait]
impl CalendarProvider for RemoteCalendar {
    async fn list_events(&self, range: &DateRange) -> DetourResult<Vec<TimedEvent>> {
        let wire_events = self
            .provider
            .call(ListEvents {
                provider_config: self.provider_config.clone(),
                from: range.from_rfc3339(self.tz)?,
                to: range.to_rfc3339(self.tz)?,
            })
            .await?;

        wire_events
            .into_iter()
            .map(|e| e.into_event(self.tz))
            .collect()
    }

    async fn insert_event(&self, event: &TimedEvent) -> DetourResult<String> {
        self.provider
            .call(InsertEvent {
                provider_config: self.provider_config.clone(),
                event: WireEvent::from_event(event, self.tz)?,
            })
            .await
    }

    async fn update_event(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DetourResult<()> {
        self.provider
            .call(UpdateEvent {
                provider_config: self.provider_config.clone(),
                event_id: id.to_string(),
                start: to_zoned_rfc3339(start, self.tz)?,
                end: to_zoned_rfc3339(end, self.tz)?,
            })
            .await
    }
}
