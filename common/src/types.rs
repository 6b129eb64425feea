use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Last-known numeric value of a sensor or actuator together with its topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemperaturePoint {
    #[serde(default)]
    pub value: f64,
    address: String,
}

impl TemperaturePoint {
    pub fn new(address: impl Into<String>, value: f64) -> Self {
        Self {
            value,
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Boolean counterpart of [`TemperaturePoint`], e.g. the holiday flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoolPoint {
    #[serde(default)]
    pub value: bool,
    address: String,
}

impl BoolPoint {
    pub fn new(address: impl Into<String>, value: bool) -> Self {
        Self {
            value,
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Auto,
    Heat,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Heat => "heat",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "heat" => Ok(Self::Heat),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_tokens_are_exact() {
        assert_eq!("auto".parse::<Mode>(), Ok(Mode::Auto));
        assert_eq!("heat".parse::<Mode>(), Ok(Mode::Heat));
        assert!("HEAT".parse::<Mode>().is_err());
        assert!(" auto".parse::<Mode>().is_err());
        assert!("cool".parse::<Mode>().is_err());
    }

    #[test]
    fn point_value_defaults_when_missing() {
        let point: TemperaturePoint =
            serde_json::from_str(r#"{"address":"heater/expected"}"#).unwrap();

        assert_eq!(point.address(), "heater/expected");
        assert_eq!(point.value, 0.0);
    }
}
