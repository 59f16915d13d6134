//! Tracker configuration, built in code or loaded from JSON.

use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PresenceError, Result},
    status::Status,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_initial_status() -> Status {
    Status::Online
}

/// Immutable once handed to a [PresenceTracker](crate::tracker::PresenceTracker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Idle time at which the user counts as away.
    #[serde(rename = "inactivity_ms", with = "millis_ser")]
    pub inactivity_duration: Duration,
    #[serde(
        rename = "poll_interval_ms",
        with = "millis_ser",
        default = "default_poll_interval"
    )]
    pub poll_interval: Duration,
    #[serde(default = "default_initial_status")]
    pub initial_status: Status,
}

impl TrackerConfig {
    pub fn new(inactivity_duration: Duration) -> Self {
        Self {
            inactivity_duration,
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_status: default_initial_status(),
        }
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    pub fn with_initial_status<S>(self, initial_status: S) -> Result<Self>
    where
        S: TryInto<Status>,
        PresenceError: From<S::Error>,
    {
        Ok(Self {
            initial_status: initial_status.try_into()?,
            ..self
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(PresenceError::InvalidPollInterval);
        }
        Ok(())
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: TrackerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

mod millis_ser {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
