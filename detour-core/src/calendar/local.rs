//! In-memory store for locally drafted events.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DetourError, DetourResult};
use crate::event::{EventOrigin, TimedEvent};

/// Locally drafted events. Updates are plain in-place mutations and cannot fail
/// once the event is known.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    events: Vec<TimedEvent>,
}

impl LocalStore {
    pub fn new(events: Vec<TimedEvent>) -> Self {
        let mut store = LocalStore::default();
        for event in events {
            store.insert(event);
        }
        store
    }

    /// Read a JSON array of events. A missing file is an empty store.
    pub fn load(path: &Path) -> DetourResult<Self> {
        if !path.exists() {
            return Ok(LocalStore::default());
        }
        let content = std::fs::read_to_string(path)?;
        let events: Vec<TimedEvent> = serde_json::from_str(&content)?;
        Ok(LocalStore::new(events))
    }

    pub fn save(&self, path: &Path) -> DetourResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.events)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<TimedEvent> {
        self.events.iter().filter(|e| e.is_on(date)).cloned().collect()
    }

    /// Add an event, assigning an id when it has none. Returns the id.
    pub fn insert(&mut self, mut event: TimedEvent) -> String {
        let id = event
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        event.id = Some(id.clone());
        event.origin = EventOrigin::LocallyDrafted;
        self.events.push(event);
        id
    }

    pub fn update(
        &mut self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DetourResult<()> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| DetourError::RescheduleWrite {
                title: id.to_string(),
                reason: "not in the local store".into(),
            })?;
        event.start = start;
        event.end = end;
        Ok(())
    }
}
