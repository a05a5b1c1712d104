//! Home Assistant auto-discovery
//!
//! [`DiscoveryCache`] remembers which sensor groups and indexed sensors were
//! already announced since Home Assistant last came online. It only decides
//! *what* must be announced; the publisher turns its answers into messages
//! built by [`discovery_message`].
//!
//! A group is marked as announced as soon as it is claimed, before any
//! message goes out. A failed transmission is therefore not retried until
//! the next reset.

use crate::config::HassConfig;
use crate::sensor::{DeviceClass, SensorDescriptor, SensorGroup, StateClass};
use serde::Serialize;
use std::collections::HashSet;

/// Sensor families whose members are announced one index at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedDomain {
    /// Index 0 is the internal sensor, 1..=32 external probes
    Temperature,
    /// Hours ahead, 0..38
    PriceHour,
    /// Month peak ranks, 0..5
    PeakRank,
}

impl IndexedDomain {
    pub fn capacity(self) -> usize {
        match self {
            IndexedDomain::Temperature => 33,
            IndexedDomain::PriceHour => 38,
            IndexedDomain::PeakRank => 5,
        }
    }
}

/// Fixed-size bitmap of announced indices
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct IndexFlags(u64);

impl IndexFlags {
    fn contains(self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    /// Returns true when the index was not set before
    fn insert(&mut self, index: usize) -> bool {
        let fresh = !self.contains(index);
        self.0 |= 1 << index;
        fresh
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Tracks announced sensor groups and indexed sensors
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    groups: HashSet<SensorGroup>,
    temperatures: IndexFlags,
    price_hours: IndexFlags,
    peak_ranks: IndexFlags,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `group` and its prerequisites for announcement.
    ///
    /// Returns the groups that were not announced yet, prerequisites first.
    /// Every returned group is marked announced on return.
    pub fn ensure_announced(&mut self, group: SensorGroup) -> Vec<SensorGroup> {
        let mut pending = Vec::new();
        self.claim(group, &mut pending);
        pending
    }

    fn claim(&mut self, group: SensorGroup, pending: &mut Vec<SensorGroup>) {
        if self.groups.contains(&group) {
            return;
        }
        for &prerequisite in group.prerequisites() {
            self.claim(prerequisite, pending);
        }
        self.groups.insert(group);
        pending.push(group);
    }

    /// Claim a single indexed sensor. Returns true when it must be announced now.
    /// Indices outside the domain's capacity are never announced.
    pub fn ensure_index_announced(&mut self, domain: IndexedDomain, index: usize) -> bool {
        if index >= domain.capacity() {
            return false;
        }
        self.flags_mut(domain).insert(index)
    }

    pub fn is_announced(&self, group: SensorGroup) -> bool {
        self.groups.contains(&group)
    }

    pub fn is_index_announced(&self, domain: IndexedDomain, index: usize) -> bool {
        index < domain.capacity() && self.flags(domain).contains(index)
    }

    /// True when nothing has been announced since creation or the last reset
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
            && self.temperatures.is_empty()
            && self.price_hours.is_empty()
            && self.peak_ranks.is_empty()
    }

    /// Forget every announcement, static and indexed
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn flags(&self, domain: IndexedDomain) -> IndexFlags {
        match domain {
            IndexedDomain::Temperature => self.temperatures,
            IndexedDomain::PriceHour => self.price_hours,
            IndexedDomain::PeakRank => self.peak_ranks,
        }
    }

    fn flags_mut(&mut self, domain: IndexedDomain) -> &mut IndexFlags {
        match domain {
            IndexedDomain::Temperature => &mut self.temperatures,
            IndexedDomain::PriceHour => &mut self.price_hours,
            IndexedDomain::PeakRank => &mut self.peak_ranks,
        }
    }
}

/// Device block shared by every discovery payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub name: String,
    pub model: String,
    pub sw_version: String,
    pub manufacturer: String,
    /// Empty when not configured
    pub configuration_url: String,
}

impl DeviceInfo {
    pub fn from_config(config: &HassConfig) -> Self {
        Self {
            identifiers: vec![config.device_id.clone()],
            name: config.device_name.clone(),
            model: config.device_model.clone(),
            sw_version: config.firmware_version.clone(),
            manufacturer: config.manufacturer.clone(),
            configuration_url: config.configuration_url.clone().unwrap_or_default(),
        }
    }
}

/// Discovery config payload of one sensor
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiscoveryPayload {
    pub name: String,
    pub state_topic: String,
    pub value_template: String,
    pub unique_id: String,
    pub device: DeviceInfo,
    /// Empty for unitless sensors
    pub unit_of_measurement: String,
    pub expire_after: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub payload: DiscoveryPayload,
}

/// Unique id suffix derived from a value path: `prices['3']` becomes `prices3`
pub fn unique_suffix(path: &str) -> String {
    path.chars().filter(|c| !matches!(c, '.' | '[' | ']' | '\'')).collect()
}

/// Build the discovery message of `sensor`.
///
/// Returns `None` for sensors denominated in the accounting currency when no
/// currency is known.
pub fn discovery_message(
    sensor: &SensorDescriptor,
    config: &HassConfig,
    device: &DeviceInfo,
    currency: Option<&str>,
) -> Option<DiscoveryMessage> {
    let unit_of_measurement = sensor.unit.resolve(currency)?;
    let unique_id = format!("{}_{}", config.device_id, unique_suffix(&sensor.path));

    Some(DiscoveryMessage {
        topic: config.discovery_topic(&unique_id),
        payload: DiscoveryPayload {
            name: format!("{}{}", config.sensor_name_prefix, sensor.name),
            state_topic: config.value_topic(sensor.topic),
            value_template: format!("{{{{ value_json.{} }}}}", sensor.path),
            unique_id,
            device: device.clone(),
            unit_of_measurement,
            expire_after: sensor.ttl,
            device_class: sensor.device_class,
            state_class: sensor.state_class,
        },
    })
}
