use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeOfDayError {
    #[error("time of day '{0}' is not in HH:MM form")]
    Format(String),
    #[error("time of day '{0}' is out of range")]
    Range(String),
}

/// Parses an `HH:MM` wall-clock time into an offset from midnight.
///
/// Fields are not range-checked: `24:00` is the following midnight and
/// `12:60` is `13:00`.
pub fn parse_time_of_day(raw: &str) -> Result<Duration, TimeOfDayError> {
    let (hour, minute) = raw
        .split_once(':')
        .ok_or_else(|| TimeOfDayError::Format(raw.to_string()))?;

    let hour = hour
        .parse::<u32>()
        .map_err(|_| TimeOfDayError::Format(raw.to_string()))?;
    let minute = minute
        .parse::<u32>()
        .map_err(|_| TimeOfDayError::Format(raw.to_string()))?;

    Ok(Duration::hours(i64::from(hour)) + Duration::minutes(i64::from(minute)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCell {
    pub from: String,
    pub to: String,
    pub temperature: f64,
}

impl ScheduleCell {
    pub fn new(from: impl Into<String>, to: impl Into<String>, temperature: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            temperature,
        }
    }

    /// The cell's window anchored on the calendar day of `now`.
    pub fn window_on(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), TimeOfDayError> {
        let from = anchor(now, &self.from)?;
        let to = anchor(now, &self.to)?;
        Ok((from, to))
    }

    /// Open interval on both ends: `now` equal to `from` or `to` is outside.
    pub fn contains(&self, now: DateTime<FixedOffset>) -> Result<bool, TimeOfDayError> {
        let (from, to) = self.window_on(now)?;
        Ok(from < now && now < to)
    }
}

fn anchor(now: DateTime<FixedOffset>, raw: &str) -> Result<DateTime<FixedOffset>, TimeOfDayError> {
    let offset = parse_time_of_day(raw)?;
    let naive = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.checked_add_signed(offset))
        .ok_or_else(|| TimeOfDayError::Range(raw.to_string()))?;
    now.offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TimeOfDayError::Range(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub workday: Vec<ScheduleCell>,
    #[serde(default)]
    pub freeday: Vec<ScheduleCell>,
    /// Required: a schedule document without it is rejected as a whole.
    pub default_temperature: f64,
}

impl Schedule {
    pub fn cells(&self, holiday: bool) -> &[ScheduleCell] {
        if holiday {
            &self.freeday
        } else {
            &self.workday
        }
    }

    pub fn resolve(&self, holiday: bool, now: DateTime<FixedOffset>) -> f64 {
        resolve(self.cells(holiday), self.default_temperature, now)
    }
}

/// Temperature in effect at `now`.
///
/// Every cell is checked in order and the last one containing `now` wins.
/// Cells whose times fail to parse are reported and skipped. A cell whose
/// `to` lies before its `from` never matches.
pub fn resolve(cells: &[ScheduleCell], default_temperature: f64, now: DateTime<FixedOffset>) -> f64 {
    let mut temperature = default_temperature;

    for cell in cells {
        match cell.contains(now) {
            Ok(true) => temperature = cell.temperature,
            Ok(false) => {}
            Err(err) => warn!("skipping schedule cell {}-{}: {err}", cell.from, cell.to),
        }
    }

    temperature
}
