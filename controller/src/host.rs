use std::{sync::Arc, time::Duration};

use anyhow::Context;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::sync::Mutex;
use tracing::{info, warn};

use roomtemp_common::{PayloadError, RuntimeConfig, ThermostatEngine, TimingConfig, TopicRouter};

use crate::{
    cli::{Args, BrokerUrl},
    clock::Clock,
    ingest,
    outbox::{self, Outbox, OutputTopics},
};

const MAX_MQTT_PAYLOAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<ThermostatEngine>>,
    router: Arc<TopicRouter>,
    outbox: Outbox,
    clock: Clock,
    mqtt: AsyncClient,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let broker: BrokerUrl = args
        .broker
        .parse()
        .with_context(|| format!("invalid broker url '{}'", args.broker))?;

    info!("reading configuration from {}", args.config.display());
    let raw = tokio::fs::read_to_string(&args.config)
        .await
        .with_context(|| format!("failed to read config file {}", args.config.display()))?;
    let config = RuntimeConfig::from_yaml_str(&raw)
        .with_context(|| format!("failed to load config file {}", args.config.display()))?;
    info!("starting with config: {config:?}");

    let clock = Clock::new(config.timezone()?);
    let engine = ThermostatEngine::new(&config, clock.now());

    let mut mqtt_options = MqttOptions::new(args.client_id.clone(), broker.host.clone(), broker.port);
    let credentials = match std::env::var("MQTT_USER") {
        Ok(user) => Some((user, std::env::var("MQTT_PASS").unwrap_or_default())),
        Err(_) => broker
            .username
            .clone()
            .map(|user| (user, broker.password.clone().unwrap_or_default())),
    };
    if let Some((user, pass)) = credentials {
        mqtt_options.set_credentials(user, pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let (outbox, publish_queue) = outbox::channel();
    outbox::spawn_publisher(
        mqtt.clone(),
        OutputTopics {
            expected: config.actuators.expected.address().to_string(),
            mode: config.mode_topic.clone(),
        },
        publish_queue,
    );

    let app_state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        router: Arc::new(TopicRouter::from_config(&config)),
        outbox,
        clock,
        mqtt,
    };

    spawn_mqtt_loop(app_state.clone(), eventloop);
    info!("connecting to {broker} as {}", args.client_id);

    let startup = app_state.engine.lock().await.startup_actions();
    app_state.outbox.send(startup);

    tokio::select! {
        result = drive(app_state, config.timing) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            info!("shutting down");
            Ok(())
        }
    }
}

async fn drive(app_state: AppState, timing: TimingConfig) -> anyhow::Result<()> {
    wait_for_schedule(&app_state, Duration::from_secs(timing.schedule_wait_secs)).await;
    run_control_loop(app_state, Duration::from_millis(timing.tick_interval_ms)).await
}

async fn subscribe_topics(app_state: &AppState) {
    for topic in app_state.router.topics() {
        if let Err(err) = app_state.mqtt.subscribe(topic, QoS::AtMostOnce).await {
            warn!("subscribe to {topic} failed: {err}");
        }
    }
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, &message.topic, &message.payload).await
                    {
                        warn!(
                            "dropping payload {:?} on {}: {err}",
                            String::from_utf8_lossy(&message.payload),
                            message.topic
                        );
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                    // Sessions are clean, so every reconnect needs fresh subscriptions.
                    subscribe_topics(&app_state).await;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: &str,
    payload: &[u8],
) -> Result<(), PayloadError> {
    let Some(route) = app_state.router.route(topic) else {
        return Ok(());
    };

    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let now = app_state.clock.now();
    let mut engine = app_state.engine.lock().await;
    let actions = ingest::apply(&mut engine, route, payload, now)?;
    // Queued under the engine lock so batches keep the order of their decisions.
    app_state.outbox.send(actions);

    Ok(())
}

async fn wait_for_schedule(app_state: &AppState, poll: Duration) {
    loop {
        {
            let engine = app_state.engine.lock().await;
            if let Some(schedule) = engine.schedule() {
                info!("starting with schedule received: {schedule:?}");
                return;
            }
        }

        info!("waiting {}s for schedule data...", poll.as_secs());
        tokio::time::sleep(poll).await;
    }
}

async fn run_control_loop(app_state: AppState, period: Duration) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        let now = app_state.clock.now();

        let mut engine = app_state.engine.lock().await;
        let actions = engine.tick(now);
        app_state.outbox.send(actions);
    }
}
