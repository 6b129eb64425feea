use chrono::{DateTime, FixedOffset};
use tracing::info;

use roomtemp_common::{EngineAction, PayloadError, Route, ThermostatEngine};

/// Feeds one inbound payload into the engine. Rejected payloads leave the
/// previous state in place and surface as an error for the caller to log.
pub fn apply(
    engine: &mut ThermostatEngine,
    route: Route,
    payload: &[u8],
    now: DateTime<FixedOffset>,
) -> Result<Vec<EngineAction>, PayloadError> {
    match route {
        Route::Holiday => {
            if engine.ingest_holiday(payload)? {
                info!("holiday mode activated");
            } else {
                info!("working days mode activated");
            }
            Ok(Vec::new())
        }
        Route::Override => {
            let value = engine.ingest_override(payload, now)?;
            let window = engine.override_window();
            info!(
                "overriding expected temperature to {value:.2} for {} min (until {})",
                window.remaining(now).num_minutes(),
                window.expires_at()
            );
            Ok(Vec::new())
        }
        Route::Mode => Ok(engine.apply_mode_command(payload, now)),
        Route::Schedule => {
            let schedule = engine.ingest_schedule(payload)?;
            info!("new schedule received: {schedule:?}");
            Ok(Vec::new())
        }
    }
}
