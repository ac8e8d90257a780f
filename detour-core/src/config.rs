//! detour configuration.
//!
//! Read from ~/.config/detour/config.toml, then overridden by `DETOUR_*`
//! environment variables (e.g. `DETOUR_BUFFER_MINUTES=45`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::RemoteCalendar;
use crate::constants::{
    DEFAULT_BUFFER_MINUTES, DEFAULT_ESTIMATOR_TIMEOUT_SECS, DEFAULT_ROUNDING_MINUTES,
    DEFAULT_TIMEZONE,
};
use crate::date_range::parse_timezone;
use crate::error::{DetourError, DetourResult};
use crate::provider::Provider;
use crate::recommend::SchedulePolicy;
use crate::travel::{
    Chain, RoutingProvider, Timeout, TravelEstimator, TravelMode, TravelRoute, TravelTable,
};

/// A provider binary plus whatever parameters it wants passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetourConfig {
    pub buffer_minutes: u32,
    pub rounding_minutes: u32,
    /// IANA zone all civil times are interpreted in
    pub timezone: String,
    pub travel_mode: TravelMode,
    pub estimator_timeout_secs: u64,
    /// JSON file holding locally drafted events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_events: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub travel: Vec<TravelRoute>,
}

impl Default for DetourConfig {
    fn default() -> Self {
        DetourConfig {
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            rounding_minutes: DEFAULT_ROUNDING_MINUTES,
            timezone: DEFAULT_TIMEZONE.to_string(),
            travel_mode: TravelMode::default(),
            estimator_timeout_secs: DEFAULT_ESTIMATOR_TIMEOUT_SECS,
            local_events: None,
            calendar: None,
            routing: None,
            travel: Vec::new(),
        }
    }
}

impl DetourConfig {
    pub fn config_path() -> DetourResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DetourError::Config("Could not determine config directory".into()))?
            .join("detour");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file means defaults.
    pub fn load() -> DetourResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> DetourResult<Self> {
        let config: DetourConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("DETOUR").try_parsing(true))
            .build()
            .map_err(|e| DetourError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DetourError::Config(e.to_string()))?;

        config.timezone()?;
        Ok(config)
    }

    pub fn policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            buffer_minutes: self.buffer_minutes,
            rounding_minutes: self.rounding_minutes,
        }
    }

    pub fn timezone(&self) -> DetourResult<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Path of the local events file with `~` expanded.
    pub fn local_events_path(&self) -> Option<PathBuf> {
        self.local_events
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
    }

    /// The travel table first, then the routing provider, under one timeout.
    pub fn estimator(&self) -> Timeout<Chain> {
        let mut estimators: Vec<Box<dyn TravelEstimator>> = Vec::new();

        if !self.travel.is_empty() {
            estimators.push(Box::new(TravelTable::new(self.travel.clone())));
        }
        if let Some(routing) = &self.routing {
            estimators.push(Box::new(RoutingProvider::new(
                Provider::routing(&routing.provider),
                routing.params.clone(),
            )));
        }

        let chain = Chain::new(estimators);
        if chain.is_empty() {
            debug!("no travel table or routing provider configured, travel time is unknown");
        }

        Timeout::new(
            chain,
            Duration::from_secs(self.estimator_timeout_secs),
        )
    }

    pub fn calendar(&self) -> DetourResult<Option<RemoteCalendar>> {
        let Some(calendar) = &self.calendar else {
            return Ok(None);
        };
        Ok(Some(RemoteCalendar::new(
            Provider::calendar(&calendar.provider),
            calendar.params.clone(),
            self.timezone()?,
        )))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DetourResult<()> {
        let contents = format!(
            "\
# detour configuration

# Minutes of cushion added after travel:
# buffer_minutes = {buffer}

# Recommended delays are shown rounded up to this many minutes:
# rounding_minutes = {rounding}

# Time zone of all event times:
# timezone = \"{tz}\"

# transit, driving, walking or bicycling:
# travel_mode = \"transit\"

# Give up on a travel estimate after this many seconds:
# estimator_timeout_secs = {timeout}

# Where locally drafted events are kept:
# local_events = \"~/.local/share/detour/events.json\"

# Calendar provider binary (detour-calendar-<provider>) and its parameters:
# [calendar]
# provider = \"google\"
# account = \"me@example.com\"

# Routing provider binary (detour-routing-<provider>) and its parameters:
# [routing]
# provider = \"kakao\"

# Known travel times, used before asking the routing provider:
# [[travel]]
# from = \"Seoul Station\"
# to = \"Gangnam\"
# minutes = 35
",
            buffer = DEFAULT_BUFFER_MINUTES,
            rounding = DEFAULT_ROUNDING_MINUTES,
            tz = DEFAULT_TIMEZONE,
            timeout = DEFAULT_ESTIMATOR_TIMEOUT_SECS,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DetourError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DetourError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Effective settings rendered as TOML.
    pub fn to_toml(&self) -> DetourResult<String> {
        toml::to_string_pretty(self).map_err(|e| DetourError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::TravelEstimate;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetourConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.policy(), SchedulePolicy::default());
        assert_eq!(config.travel_mode, TravelMode::Transit);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Seoul);
        assert!(config.calendar().unwrap().is_none());
    }

    #[test]
    fn generated_default_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        DetourConfig::create_default_config(&path).unwrap();

        let config = DetourConfig::load_from(&path).unwrap();
        assert_eq!(config.buffer_minutes, DEFAULT_BUFFER_MINUTES);
        assert!(config.travel.is_empty());
    }

    #[tokio::test]
    async fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
buffer_minutes = 60
travel_mode = "driving"

[calendar]
provider = "google"
account = "me@example.com"

[[travel]]
from = "Home"
to = "Office"
minutes = 40

[[travel]]
from = "Home"
to = "Office"
minutes = 25
mode = "driving"
"#,
        )
        .unwrap();

        let config = DetourConfig::load_from(&path).unwrap();
        assert_eq!(config.policy().buffer_minutes, 60);
        assert_eq!(config.travel_mode, TravelMode::Driving);

        let calendar = config.calendar().unwrap().unwrap();
        assert_eq!(calendar.provider().binary_name(), "detour-calendar-google");
        assert_eq!(config.calendar.as_ref().unwrap().params["account"], "me@example.com");

        let estimator = config.estimator();
        assert_eq!(
            estimator.estimate("Office", "Home", TravelMode::Driving).await,
            TravelEstimate::Minutes(25)
        );
        assert_eq!(
            estimator.estimate("Office", "Home", TravelMode::Transit).await,
            TravelEstimate::Minutes(40)
        );
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timezone = \"Nowhere/Special\"\n").unwrap();
        assert!(matches!(
            DetourConfig::load_from(&path),
            Err(DetourError::Config(_))
        ));
    }

    #[test]
    fn tilde_in_local_events_is_expanded() {
        let config = DetourConfig {
            local_events: Some(PathBuf::from("~/events.json")),
            ..DetourConfig::default()
        };
        let path = config.local_events_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
    }
}
