//! Home Assistant publisher
//!
//! [`HassPublisher`] owns the discovery cache and executes every publication:
//! tiered meter readings, realtime accounting, prices, temperatures and
//! device state. Each publication announces the sensors it feeds first, then
//! sends its value payload.
//!
//! The publisher is driven from a single task; `&mut self` on every publish
//! operation keeps the cache and throttle state free of locking.

use crate::accounting::AccountingSnapshot;
use crate::clock::{Clock, SystemClock};
use crate::config::HassConfig;
use crate::discovery::{discovery_message, DeviceInfo, DiscoveryCache, IndexedDomain};
use crate::dispatch::{plan, PublishAction};
use crate::error::PublishError;
use crate::hardware::{HardwareStatus, TemperatureProbe};
use crate::payload::{
    round, BasicPower, DetailedPower, EnergyCounters, ExtendedPower, PricesPayload, RealtimePayload,
    StatePayload, TemperaturesPayload,
};
use crate::price::{analyze, PriceSeries};
use crate::reading::{MeterReading, Tier};
use crate::sensor::{peak_sensor, price_hour_sensor, temperature_sensor, topics, SensorDescriptor, SensorGroup};
use crate::transport::Transport;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HassPublisher<T, C = SystemClock> {
    config: HassConfig,
    device: DeviceInfo,
    transport: T,
    clock: C,
    cache: DiscoveryCache,
    /// Accumulated reading in merge mode
    merged: Option<MeterReading>,
    /// Uptime at the last admitted merge-mode publication
    last_state_update: Duration,
}

impl<T: Transport> HassPublisher<T, SystemClock> {
    pub fn new(config: HassConfig, transport: T) -> Self {
        Self::with_clock(config, transport, SystemClock::new())
    }
}

impl<T: Transport, C: Clock> HassPublisher<T, C> {
    pub fn with_clock(config: HassConfig, transport: T, clock: C) -> Self {
        let device = DeviceInfo::from_config(&config);
        Self {
            config,
            device,
            transport,
            clock,
            cache: DiscoveryCache::new(),
            merged: None,
            last_state_update: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &HassConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn discovery(&self) -> &DiscoveryCache {
        &self.cache
    }

    /// Handle a message received on a subscribed topic.
    ///
    /// Returns true when it was Home Assistant coming online, in which case
    /// every sensor will be announced again on its next publication.
    pub fn on_message(&mut self, topic: &str, payload: &[u8]) -> bool {
        if topic != self.config.status_topic || payload != b"online" {
            return false;
        }
        info!("Home Assistant is online, discovery will be re-sent");
        self.cache.reset();
        true
    }

    /// Publish a meter reading, announcing the sensors of every tier it feeds.
    ///
    /// `previous` is only used in merge mode, as the base the accumulated state
    /// is layered on. Every planned publication is attempted; the first
    /// transport failure is returned.
    pub async fn publish(
        &mut self,
        update: &MeterReading,
        previous: Option<&MeterReading>,
        accounting: Option<&AccountingSnapshot>,
    ) -> Result<(), PublishError> {
        if self.config.state_update {
            self.accumulate(update, previous);
        }
        self.ensure_ready()?;
        self.ensure_clock_synced()?;

        let reading = if self.config.state_update {
            self.admit_state_update()?;
            self.merged.clone().unwrap_or_else(|| update.clone())
        } else {
            update.clone()
        };

        let mut outcome = Ok(());
        for action in plan(&reading, accounting) {
            let result = match action {
                PublishAction::Realtime { .. } => match accounting {
                    Some(snapshot) => self.realtime(snapshot).await,
                    None => Ok(()),
                },
                _ => self.reading_action(action, &reading).await,
            };
            if let Err(e) = result {
                warn!(?action, "publication failed: {e}");
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        outcome
    }

    /// Publish realtime accounting figures on their own
    pub async fn publish_realtime(&mut self, snapshot: &AccountingSnapshot) -> Result<(), PublishError> {
        self.ensure_ready()?;
        self.ensure_clock_synced()?;
        if !snapshot.initialized {
            return Err(PublishError::NoData);
        }
        self.realtime(snapshot).await
    }

    /// Publish the price series and its cheapest windows.
    ///
    /// Refused when the current hour has no price. Each hour sensor is
    /// announced the first time its hour carries a value.
    pub async fn publish_prices(&mut self, prices: &PriceSeries) -> Result<(), PublishError> {
        self.ensure_ready()?;
        if prices.value_for_hour(0).is_none() {
            return Err(PublishError::NoData);
        }

        let currency = prices.currency();
        self.announce(SensorGroup::Price, currency).await;
        let hours = prices.hours();
        for (hour, value) in hours.iter().enumerate() {
            if value.is_some() && self.cache.ensure_index_announced(IndexedDomain::PriceHour, hour) {
                self.announce_sensor(&price_hour_sensor(hour), currency).await;
            }
        }

        let payload = PricesPayload::new(&self.config.device_id, hours, &analyze(&hours), self.clock.now_utc());
        self.send(topics::PRICES, &payload, true).await
    }

    /// Publish external temperature probes; needs at least two of them
    pub async fn publish_temperatures(&mut self, probes: &[TemperatureProbe]) -> Result<(), PublishError> {
        self.ensure_ready()?;
        if probes.len() < 2 {
            return Err(PublishError::NoData);
        }

        let mut payload = TemperaturesPayload::default();
        for (i, probe) in probes.iter().enumerate() {
            let address = probe.address_hex();
            if self.cache.ensure_index_announced(IndexedDomain::Temperature, i + 1) {
                self.announce_sensor(&temperature_sensor(i + 1, &address), None).await;
            }
            payload.temperatures.insert(address, round(probe.value, 2));
        }
        self.send(topics::TEMPERATURES, &payload, false).await
    }

    /// Publish device state: uptime, supply voltage, signal and internal temperature
    pub async fn publish_system(&mut self, status: &HardwareStatus) -> Result<(), PublishError> {
        self.ensure_ready()?;

        self.announce(SensorGroup::System, None).await;
        if status.has_internal_temperature() && self.cache.ensure_index_announced(IndexedDomain::Temperature, 0) {
            self.announce_sensor(&temperature_sensor(0, ""), None).await;
        }

        let payload = StatePayload {
            id: self.config.device_id.clone(),
            name: self.config.client_id.clone(),
            up: self.clock.uptime().as_secs(),
            vcc: round(status.vcc, 3),
            rssi: status.rssi,
            temp: round(status.temperature, 2),
            version: self.config.firmware_version.clone(),
        };
        self.send(topics::STATE, &payload, false).await
    }

    fn ensure_ready(&self) -> Result<(), PublishError> {
        if self.config.base_topic.is_empty() || !self.transport.is_connected() {
            return Err(PublishError::NotReady);
        }
        Ok(())
    }

    fn ensure_clock_synced(&self) -> Result<(), PublishError> {
        if self.clock.now_utc().timestamp() < self.config.min_valid_epoch {
            return Err(PublishError::ClockNotSynced);
        }
        Ok(())
    }

    /// Layer `update` over the accumulated state, itself over `previous`
    fn accumulate(&mut self, update: &MeterReading, previous: Option<&MeterReading>) {
        let mut merged = previous.cloned().unwrap_or_default();
        if let Some(accumulated) = &self.merged {
            merged.apply(accumulated);
        }
        merged.apply(update);
        self.merged = Some(merged);
    }

    fn admit_state_update(&mut self) -> Result<(), PublishError> {
        let now = self.clock.uptime();
        let interval = Duration::from_secs(self.config.state_update_interval_secs);
        if now.saturating_sub(self.last_state_update) < interval {
            return Err(PublishError::Throttled);
        }
        self.last_state_update = now;
        Ok(())
    }

    async fn reading_action(&mut self, action: PublishAction, reading: &MeterReading) -> Result<(), PublishError> {
        for group in action.groups() {
            self.announce(group, None).await;
        }
        match action {
            PublishAction::Energy { .. } => self.send(topics::ENERGY, &EnergyCounters::from(reading), false).await,
            PublishAction::Power { tier: Tier::One, .. } => {
                self.send(topics::POWER, &BasicPower::from(reading), false).await
            }
            PublishAction::Power { tier: Tier::Two | Tier::Three, .. } => {
                self.send(topics::POWER, &ExtendedPower::from(reading), false).await
            }
            PublishAction::Power { tier: Tier::Four, .. } => {
                self.send(topics::POWER, &DetailedPower::from(reading), false).await
            }
            PublishAction::Realtime { .. } => Ok(()),
        }
    }

    async fn realtime(&mut self, snapshot: &AccountingSnapshot) -> Result<(), PublishError> {
        let currency = snapshot.currency.as_deref();
        let action = PublishAction::Realtime { export: snapshot.has_production() };
        for group in action.groups() {
            self.announce(group, currency).await;
        }
        for rank in 0..snapshot.published_peak_count() {
            if self.cache.ensure_index_announced(IndexedDomain::PeakRank, rank) {
                self.announce_sensor(&peak_sensor(rank), currency).await;
            }
        }
        self.send(topics::REALTIME, &RealtimePayload::from(snapshot), false).await
    }

    /// Announce `group` and whatever it depends on, if not done since the last reset
    async fn announce(&mut self, group: SensorGroup, currency: Option<&str>) {
        for pending in self.cache.ensure_announced(group) {
            debug!(group = ?pending, "announcing sensors");
            for sensor in pending.catalog() {
                self.announce_sensor(sensor, currency).await;
            }
            self.transport.service().await;
        }
    }

    /// Send one discovery message. Failures are logged and not retried.
    async fn announce_sensor(&self, sensor: &SensorDescriptor, currency: Option<&str>) {
        let Some(message) = discovery_message(sensor, &self.config, &self.device, currency) else {
            debug!(path = %sensor.path, "no currency, sensor not announced");
            return;
        };
        let payload = match serde_json::to_string(&message.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(topic = %message.topic, "discovery payload not serializable: {e}");
                return;
            }
        };
        debug!(topic = %message.topic, "discovery");
        if let Err(e) = self.transport.publish(&message.topic, payload, true).await {
            warn!(topic = %message.topic, "discovery not sent: {e}");
        }
    }

    async fn send<P: Serialize>(&self, suffix: &str, payload: &P, retain: bool) -> Result<(), PublishError> {
        let json = serde_json::to_string(payload)?;
        let topic = self.config.value_topic(suffix);
        self.transport.publish(&topic, json, retain).await?;
        self.transport.service().await;
        Ok(())
    }
}
