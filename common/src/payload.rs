//! Strict decoders for inbound MQTT payloads.

use crate::schedule::Schedule;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is not valid utf-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("'{0}' is not a boolean")]
    Bool(String),
    #[error("'{0}' is not a finite number")]
    Float(String),
    #[error("schedule payload rejected: {0}")]
    Schedule(#[from] serde_json::Error),
}

pub fn as_text(payload: &[u8]) -> Result<&str, PayloadError> {
    Ok(std::str::from_utf8(payload)?)
}

/// Accepts the usual boolean spellings (`true`, `TRUE`, `True`, `t`, `1` and
/// the matching false forms). No surrounding whitespace is tolerated.
pub fn parse_bool(raw: &str) -> Result<bool, PayloadError> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(PayloadError::Bool(other.to_string())),
    }
}

pub fn parse_float(raw: &str) -> Result<f64, PayloadError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PayloadError::Float(raw.to_string())),
    }
}

/// Decodes a complete schedule. Nothing is returned unless the whole document
/// is valid.
pub fn decode_schedule(payload: &[u8]) -> Result<Schedule, PayloadError> {
    Ok(serde_json::from_slice(payload)?)
}
