use chrono::{DateTime, FixedOffset};

use crate::{
    config::RuntimeConfig,
    mode::ModeMachine,
    override_window::OverrideWindow,
    payload::{self, PayloadError},
    schedule::Schedule,
    types::{BoolPoint, Mode, TemperaturePoint},
};

/// Side effects requested by the engine. The host turns these into MQTT
/// publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineAction {
    /// Retained publish of the new setpoint on the expected-temperature topic.
    SetExpected(f64),
    /// Non-retained publish on the mode topic.
    AnnounceMode(Mode),
}

/// Decision state for one zone: everything ingested from the network plus
/// the last setpoint handed to the actuator.
#[derive(Debug, Clone)]
pub struct ThermostatEngine {
    holiday: BoolPoint,
    override_point: TemperaturePoint,
    expected: TemperaturePoint,
    expected_published: bool,
    schedule: Option<Schedule>,
    window: OverrideWindow,
    mode: Option<ModeMachine>,
}

impl ThermostatEngine {
    pub fn new(config: &RuntimeConfig, now: DateTime<FixedOffset>) -> Self {
        Self {
            holiday: config.sensors.holiday.clone(),
            override_point: config.sensors.override_point.clone(),
            expected: config.actuators.expected.clone(),
            expected_published: false,
            schedule: None,
            window: OverrideWindow::new(now, config.timing.override_duration()),
            mode: config.mode_topic.as_ref().map(|_| ModeMachine::new()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn holiday(&self) -> bool {
        self.holiday.value
    }

    pub fn override_value(&self) -> f64 {
        self.override_point.value
    }

    pub fn expected(&self) -> &TemperaturePoint {
        &self.expected
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode.map(|machine| machine.mode())
    }

    pub fn override_window(&self) -> &OverrideWindow {
        &self.window
    }

    pub fn is_override_active(&self, now: DateTime<FixedOffset>) -> bool {
        self.window.is_active(now)
    }

    /// Actions to run once the transport is up: the initial mode is announced.
    pub fn startup_actions(&self) -> Vec<EngineAction> {
        self.mode
            .map(|machine| vec![EngineAction::AnnounceMode(machine.mode())])
            .unwrap_or_default()
    }

    pub fn ingest_holiday(&mut self, raw: &[u8]) -> Result<bool, PayloadError> {
        let value = payload::parse_bool(payload::as_text(raw)?)?;
        self.holiday.value = value;
        Ok(value)
    }

    /// The override window restarts before the value is validated, so even a
    /// rejected payload keeps the previous override value in force.
    pub fn ingest_override(
        &mut self,
        raw: &[u8],
        now: DateTime<FixedOffset>,
    ) -> Result<f64, PayloadError> {
        self.window.extend(now);
        let value = payload::parse_float(payload::as_text(raw)?)?;
        self.override_point.value = value;
        Ok(value)
    }

    /// Replaces the schedule wholesale; a rejected document leaves the current
    /// one untouched.
    pub fn ingest_schedule(&mut self, raw: &[u8]) -> Result<&Schedule, PayloadError> {
        let schedule = payload::decode_schedule(raw)?;
        Ok(self.schedule.insert(schedule))
    }

    /// Unknown or undecodable commands are dropped without a trace.
    pub fn apply_mode_command(
        &mut self,
        raw: &[u8],
        now: DateTime<FixedOffset>,
    ) -> Vec<EngineAction> {
        let (Some(machine), Ok(command)) = (self.mode.as_mut(), payload::as_text(raw)) else {
            return Vec::new();
        };

        machine
            .command(command, now, &mut self.window)
            .map(|mode| vec![EngineAction::AnnounceMode(mode)])
            .unwrap_or_default()
    }

    /// Target setpoint for `now`, or `None` before any schedule arrived and
    /// with no override in force.
    pub fn target(&self, now: DateTime<FixedOffset>) -> Option<f64> {
        let heating_override = match self.mode {
            Some(machine) => machine.mode() == Mode::Heat,
            None => self.window.is_active(now),
        };

        if heating_override {
            return Some(self.override_point.value);
        }

        self.schedule
            .as_ref()
            .map(|schedule| schedule.resolve(self.holiday.value, now))
    }

    pub fn tick(&mut self, now: DateTime<FixedOffset>) -> Vec<EngineAction> {
        let mut actions = Vec::new();

        let override_active = self.window.is_active(now);
        if let Some(mode) = self.mode.as_mut().and_then(|machine| machine.sync(override_active)) {
            actions.push(EngineAction::AnnounceMode(mode));
        }

        if let Some(target) = self.target(now) {
            actions.extend(self.set_expected(target));
        }

        actions
    }

    /// Emits a setpoint only when it differs from the last one emitted.
    pub fn set_expected(&mut self, value: f64) -> Option<EngineAction> {
        if self.expected_published && (self.expected.value - value).abs() <= f64::EPSILON {
            return None;
        }

        self.expected.value = value;
        self.expected_published = true;
        Some(EngineAction::SetExpected(value))
    }
}
