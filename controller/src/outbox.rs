use rumqttc::{AsyncClient, QoS};
use tokio::sync::mpsc;
use tracing::{info, warn};

use roomtemp_common::EngineAction;

#[derive(Debug, Clone)]
pub struct OutputTopics {
    pub expected: String,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl OutputTopics {
    /// `None` for mode announcements when no mode topic is configured.
    pub fn publication(&self, action: EngineAction) -> Option<Publication> {
        match action {
            EngineAction::SetExpected(value) => Some(Publication {
                topic: self.expected.clone(),
                payload: format!("{value:.2}"),
                // Retained so a restarted actuator picks up the last setpoint.
                retain: true,
            }),
            EngineAction::AnnounceMode(mode) => self.mode.as_ref().map(|topic| Publication {
                topic: topic.clone(),
                payload: mode.as_str().to_string(),
                retain: false,
            }),
        }
    }
}

/// Sending half of the single publish queue. Batches leave in the order they
/// were queued, whichever task produced them.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Vec<EngineAction>>,
}

pub fn channel() -> (Outbox, mpsc::UnboundedReceiver<Vec<EngineAction>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox { tx }, rx)
}

impl Outbox {
    pub fn send(&self, actions: Vec<EngineAction>) {
        if actions.is_empty() {
            return;
        }
        if self.tx.send(actions).is_err() {
            warn!("publisher stopped, dropping engine actions");
        }
    }
}

pub fn spawn_publisher(
    mqtt: AsyncClient,
    outputs: OutputTopics,
    mut rx: mpsc::UnboundedReceiver<Vec<EngineAction>>,
) {
    tokio::spawn(async move {
        while let Some(actions) = rx.recv().await {
            for action in actions {
                match action {
                    EngineAction::SetExpected(value) => {
                        info!("setting expected temperature to {value:.2}")
                    }
                    EngineAction::AnnounceMode(mode) => info!("mode set to {mode}"),
                }
                let Some(publication) = outputs.publication(action) else {
                    continue;
                };
                if let Err(err) = mqtt
                    .publish(
                        publication.topic.as_str(),
                        QoS::AtMostOnce,
                        publication.retain,
                        publication.payload,
                    )
                    .await
                {
                    warn!("publish to {} failed: {err}", publication.topic);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, TimeZone};

    use roomtemp_common::{Mode, Route, RuntimeConfig, ThermostatEngine};

    use super::*;
    use crate::ingest;

    const CONFIG: &str = "
actuators:
  expected:
    address: heater/expected
sensors:
  holiday:
    address: calendar/holiday
  override:
    address: thermostat/override
scheduleTopic: scheduler/schedule
modeTopic: thermostat/mode
";

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 6, 2, hour, minute, second)
            .unwrap()
    }

    fn outputs(mode: Option<&str>) -> OutputTopics {
        OutputTopics {
            expected: "heater/expected".to_string(),
            mode: mode.map(str::to_string),
        }
    }

    #[test]
    fn quick_mode_commands_publish_in_arrival_order() {
        let config = RuntimeConfig::from_yaml_str(CONFIG).unwrap();
        let mut engine = ThermostatEngine::new(&config, at(7, 0, 0));
        let (outbox, mut rx) = channel();

        for (command, now) in [(&b"heat"[..], at(7, 0, 0)), (&b"auto"[..], at(7, 0, 1))] {
            outbox.send(ingest::apply(&mut engine, Route::Mode, command, now).unwrap());
        }
        drop(outbox);

        let topics = outputs(Some("thermostat/mode"));
        let mut published = Vec::new();
        while let Ok(actions) = rx.try_recv() {
            published.extend(
                actions
                    .into_iter()
                    .filter_map(|action| topics.publication(action))
                    .map(|publication| publication.payload),
            );
        }

        assert_eq!(published, vec!["heat", "auto"]);
        assert_eq!(engine.mode(), Some(Mode::Auto));
    }

    #[test]
    fn empty_batches_are_not_queued() {
        let (outbox, mut rx) = channel();
        outbox.send(Vec::new());
        outbox.send(vec![EngineAction::SetExpected(21.0)]);

        assert_eq!(rx.try_recv().unwrap(), vec![EngineAction::SetExpected(21.0)]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publications_follow_output_topics() {
        let topics = outputs(Some("thermostat/mode"));

        assert_eq!(
            topics.publication(EngineAction::SetExpected(21.5)),
            Some(Publication {
                topic: "heater/expected".to_string(),
                payload: "21.50".to_string(),
                retain: true,
            })
        );
        assert_eq!(
            topics.publication(EngineAction::AnnounceMode(Mode::Heat)),
            Some(Publication {
                topic: "thermostat/mode".to_string(),
                payload: "heat".to_string(),
                retain: false,
            })
        );
        assert_eq!(
            outputs(None).publication(EngineAction::AnnounceMode(Mode::Auto)),
            None
        );
    }
}
