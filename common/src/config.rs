use std::collections::HashSet;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::types::{BoolPoint, TemperaturePoint};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{0} address must not be empty")]
    EmptyAddress(&'static str),
    #[error("topic '{0}' is configured more than once")]
    DuplicateAddress(String),
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("timing.{0} must be greater than zero")]
    ZeroTiming(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Actuators {
    pub expected: TemperaturePoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sensors {
    pub holiday: BoolPoint,
    #[serde(rename = "override")]
    pub override_point: TemperaturePoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TimingConfig {
    pub tick_interval_ms: u64,
    pub override_minutes: u32,
    pub schedule_wait_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            override_minutes: 60,
            schedule_wait_secs: 15,
        }
    }
}

impl TimingConfig {
    pub fn override_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.override_minutes))
    }
}

/// Topic mapping and tuning for one thermostat zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuntimeConfig {
    pub actuators: Actuators,
    pub sensors: Sensors,
    pub schedule_topic: String,
    /// Mode handling is disabled when no topic is configured.
    #[serde(default)]
    pub mode_topic: Option<String>,
    /// IANA name; the system local zone is used when unset.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl RuntimeConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut addresses = vec![
            ("actuators.expected", self.actuators.expected.address()),
            ("sensors.holiday", self.sensors.holiday.address()),
            ("sensors.override", self.sensors.override_point.address()),
            ("scheduleTopic", self.schedule_topic.as_str()),
        ];
        if let Some(mode_topic) = &self.mode_topic {
            addresses.push(("modeTopic", mode_topic.as_str()));
        }

        let mut seen = HashSet::new();
        for (name, address) in addresses {
            if address.trim().is_empty() {
                return Err(ConfigError::EmptyAddress(name));
            }
            if !seen.insert(address) {
                return Err(ConfigError::DuplicateAddress(address.to_string()));
            }
        }

        self.timezone()?;

        if self.timing.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTiming("tickIntervalMs"));
        }
        if self.timing.override_minutes == 0 {
            return Err(ConfigError::ZeroTiming("overrideMinutes"));
        }
        if self.timing.schedule_wait_secs == 0 {
            return Err(ConfigError::ZeroTiming("scheduleWaitSecs"));
        }

        Ok(())
    }

    pub fn timezone(&self) -> Result<Option<Tz>, ConfigError> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
            })
            .transpose()
    }
}
