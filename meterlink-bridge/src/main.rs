//! Meterlink Bridge - AMS meter telemetry to Home Assistant over MQTT
//!
//! Listens for meter readings, prices, accounting and hardware status on the
//! source topics, and republishes them for Home Assistant:
//! - Auto-discovery, re-sent whenever Home Assistant comes back online
//! - Tiered power and energy payloads, realtime accounting and prices
//! - Periodic device state and temperatures

mod config;
mod sources;

use anyhow::{Context, Result};
use config::BridgeConfig;
use meterlink_core::{
    spawn_event_loop, AccountingSnapshot, HardwareStatus, HassPublisher, InboundMessage, LinkEvent, MeterReading,
    MqttTransport, PublishError,
};
use rumqttc::{AsyncClient, MqttOptions, QoS};
use sources::SourceUpdate;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "meterlink_core=info,meterlink_bridge=info";

/// Bridge state, owned by the main task
struct Bridge {
    config: BridgeConfig,
    client: AsyncClient,
    publisher: HassPublisher<MqttTransport>,
    last_reading: Option<MeterReading>,
    accounting: Option<AccountingSnapshot>,
    hardware: Option<HardwareStatus>,
}

impl Bridge {
    fn new(config: BridgeConfig, client: AsyncClient, transport: MqttTransport) -> Self {
        let publisher = HassPublisher::new(config.hass.clone(), transport);
        Self {
            config,
            client,
            publisher,
            last_reading: None,
            accounting: None,
            hardware: None,
        }
    }

    async fn run(&mut self, mut events: mpsc::UnboundedReceiver<LinkEvent>) -> Result<()> {
        info!("Starting bridge main loop...");
        let mut system_timer = interval(self.config.system_interval());

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(LinkEvent::Connected) => {
                        if let Err(e) = self.subscribe().await {
                            error!("{e:#}");
                        }
                    }
                    Some(LinkEvent::Message(message)) => self.handle(message).await,
                    None => anyhow::bail!("MQTT event loop stopped"),
                },

                _ = system_timer.tick() => self.publish_system().await,

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Subscribe to the status topic and the source topics, on every (re)connect
    async fn subscribe(&self) -> Result<()> {
        let status_topic = &self.config.hass.status_topic;
        let topics = std::iter::once(status_topic.as_str()).chain(self.config.sources.all());
        for topic in topics {
            self.client
                .subscribe(topic, QoS::AtMostOnce)
                .await
                .with_context(|| format!("Failed to subscribe to {topic}"))?;
            debug!("Subscribed to {topic}");
        }
        info!("Subscriptions in place");
        Ok(())
    }

    async fn handle(&mut self, message: InboundMessage) {
        if self.publisher.on_message(&message.topic, &message.payload) {
            return;
        }

        let update = match sources::parse(&self.config.sources, &message) {
            Ok(Some(update)) => update,
            Ok(None) => {
                debug!("Ignoring message on {}", message.topic);
                return;
            }
            Err(e) => {
                warn!("Dropping malformed message on {}: {e}", message.topic);
                return;
            }
        };

        match update {
            SourceUpdate::Reading(reading) => {
                let result = self
                    .publisher
                    .publish(&reading, self.last_reading.as_ref(), self.accounting.as_ref())
                    .await;
                log_outcome("reading", result);
                self.last_reading = Some(reading);
            }
            SourceUpdate::Prices(prices) => {
                let result = self.publisher.publish_prices(&prices).await;
                log_outcome("prices", result);
            }
            SourceUpdate::Accounting(snapshot) => {
                debug!("Accounting updated, published with the next reading");
                self.accounting = Some(snapshot);
            }
            SourceUpdate::Hardware(status) => self.hardware = Some(status),
        }
    }

    async fn publish_system(&mut self) {
        let Some(status) = self.hardware.clone() else {
            return;
        };
        log_outcome("state", self.publisher.publish_system(&status).await);
        log_outcome("temperatures", self.publisher.publish_temperatures(&status.probes).await);
    }
}

/// Transient refusals are expected and only traced; real failures are warned about
fn log_outcome(what: &str, result: Result<(), PublishError>) {
    match result {
        Ok(()) => debug!("Published {what}"),
        Err(e @ (PublishError::Throttled | PublishError::ClockNotSynced | PublishError::NoData)) => {
            debug!("Skipped {what}: {e}")
        }
        Err(e) => warn!("Failed to publish {what}: {e}"),
    }
}

fn mqtt_options(config: &BridgeConfig) -> MqttOptions {
    let mut options = MqttOptions::new(config.client_id(), &config.mqtt.host, config.mqtt.port);
    options.set_keep_alive(Duration::from_secs(config.mqtt.keep_alive_secs));
    if let Some(username) = &config.mqtt.username {
        options.set_credentials(username, config.mqtt.password.clone().unwrap_or_default());
    }
    options
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    info!("Meterlink bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = BridgeConfig::load().await.context("Failed to load configuration")?;
    info!("Broker {}:{} as {}", config.mqtt.host, config.mqtt.port, config.client_id());

    let (client, eventloop) = AsyncClient::new(mqtt_options(&config), 64);
    let connected = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::unbounded_channel();
    let event_loop = spawn_event_loop(eventloop, connected.clone(), tx);

    let transport = MqttTransport::new(client.clone(), connected);
    let mut bridge = Bridge::new(config, client, transport);
    let outcome = bridge.run(rx).await.context("Bridge execution failed");

    event_loop.abort();
    outcome
}
