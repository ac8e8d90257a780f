//! Date range for fetching a day's timeline, plus civil <-> zoned conversion.
//!
//! Event times are civil (`NaiveDateTime`) inside the core. Providers exchange
//! them as RFC 3339 strings carrying the configured zone's offset.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{DetourError, DetourResult};

/// Half-open civil range `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    /// The whole calendar day of `date`.
    pub fn day(date: NaiveDate) -> Self {
        let from = date.and_time(chrono::NaiveTime::MIN);
        DateRange {
            from,
            to: from + Duration::days(1),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.from && at < self.to
    }

    /// Get `from` as RFC3339 string in `tz`.
    pub fn from_rfc3339(&self, tz: Tz) -> DetourResult<String> {
        to_zoned_rfc3339(self.from, tz)
    }

    /// Get `to` as RFC3339 string in `tz`.
    pub fn to_rfc3339(&self, tz: Tz) -> DetourResult<String> {
        to_zoned_rfc3339(self.to, tz)
    }
}

/// Attach `tz` to a civil time and render it with its offset.
pub fn to_zoned_rfc3339(at: NaiveDateTime, tz: Tz) -> DetourResult<String> {
    // Ambiguous local times (DST fold) resolve to the earlier instant
    tz.from_local_datetime(&at)
        .earliest()
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| {
            DetourError::Serialization(format!("{} does not exist in time zone {}", at, tz))
        })
}

/// Parse an RFC 3339 timestamp and express it as civil time in `tz`.
pub fn from_zoned_rfc3339(s: &str, tz: Tz) -> DetourResult<NaiveDateTime> {
    let dt = DateTime::parse_from_rfc3339(s)
        .map_err(|e| DetourError::Serialization(format!("Invalid timestamp '{}': {}", s, e)))?;
    Ok(dt.with_timezone(&tz).naive_local())
}

/// Parse an IANA zone name such as `Asia/Seoul`.
pub fn parse_timezone(name: &str) -> DetourResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| DetourError::Config(format!("Unknown time zone '{}'", name)))
}
