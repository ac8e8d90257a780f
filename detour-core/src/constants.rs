use std::time::Duration;

/// Cushion added after travel so that arrival is never merely exact.
pub const DEFAULT_BUFFER_MINUTES: u32 = 30;

/// Granularity the displayed delay is rounded up to.
pub const DEFAULT_ROUNDING_MINUTES: u32 = 10;

/// Civil time zone every event time is interpreted in.
pub const DEFAULT_TIMEZONE: &str = "Asia/Seoul";

pub const DEFAULT_ESTIMATOR_TIMEOUT_SECS: u64 = 10;

/// Budget for a single provider subprocess round-trip.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

pub const CALENDAR_PROVIDER_PREFIX: &str = "detour-calendar-";
pub const ROUTING_PROVIDER_PREFIX: &str = "detour-routing-";
