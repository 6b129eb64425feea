pub mod config;
pub mod mode;
pub mod override_window;
pub mod payload;
pub mod schedule;
pub mod thermostat;
pub mod topics;
pub mod types;

pub use config::{RuntimeConfig, TimingConfig};
pub use mode::ModeMachine;
pub use override_window::OverrideWindow;
pub use payload::PayloadError;
pub use schedule::{Schedule, ScheduleCell};
pub use thermostat::{EngineAction, ThermostatEngine};
pub use topics::{Route, TopicRouter};
pub use types::{BoolPoint, Mode, TemperaturePoint};
