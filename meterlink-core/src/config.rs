//! Publisher configuration
//!
//! Every field has a default so a partial `[hass]` table is enough.

use serde::{Deserialize, Serialize};

/// Earliest wall-clock time (2024-01-01T00:00:00Z) accepted as synchronized
pub const DEFAULT_MIN_VALID_EPOCH: i64 = 1_704_067_200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HassConfig {
    /// Base topic for value payloads (`<base>/power`, `<base>/prices`, ...)
    pub base_topic: String,
    /// Root of the discovery topics
    pub discovery_prefix: String,
    /// Topic on which Home Assistant announces its own availability
    pub status_topic: String,
    pub client_id: String,
    /// Device identifier used in unique ids and in the `id` payload field
    pub device_id: String,
    pub device_name: String,
    pub device_model: String,
    pub manufacturer: String,
    pub configuration_url: Option<String>,
    /// Prepended to every sensor display name
    pub sensor_name_prefix: String,
    /// Merge mode: accumulate readings and publish at most once per interval
    pub state_update: bool,
    pub state_update_interval_secs: u64,
    /// Nothing is dispatched while the clock reads earlier than this epoch
    pub min_valid_epoch: i64,
    pub firmware_version: String,
}

impl Default for HassConfig {
    fn default() -> Self {
        Self {
            base_topic: "meterlink".to_string(),
            discovery_prefix: "homeassistant".to_string(),
            status_topic: "homeassistant/status".to_string(),
            client_id: "meterlink".to_string(),
            device_id: "meterlink".to_string(),
            device_name: "AMS reader".to_string(),
            device_model: "Meterlink bridge".to_string(),
            manufacturer: "Meterlink".to_string(),
            configuration_url: None,
            sensor_name_prefix: String::new(),
            state_update: false,
            state_update_interval_secs: 10,
            min_valid_epoch: DEFAULT_MIN_VALID_EPOCH,
            firmware_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl HassConfig {
    /// Full topic for a value payload suffix such as `/power`
    pub fn value_topic(&self, suffix: &str) -> String {
        format!("{}{}", self.base_topic, suffix)
    }

    /// Discovery config topic for a sensor unique id
    pub fn discovery_topic(&self, unique_id: &str) -> String {
        format!("{}/sensor/{}/config", self.discovery_prefix.trim_end_matches('/'), unique_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HassConfig::default();
        assert_eq!(config.status_topic, "homeassistant/status");
        assert!(!config.state_update);
        assert_eq!(config.min_valid_epoch, DEFAULT_MIN_VALID_EPOCH);
    }

    #[test]
    fn test_topics() {
        let config = HassConfig {
            base_topic: "ams".to_string(),
            discovery_prefix: "homeassistant/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.value_topic("/power"), "ams/power");
        assert_eq!(config.discovery_topic("abc_P"), "homeassistant/sensor/abc_P/config");
    }

    #[test]
    fn test_partial_deserialize() {
        let config: HassConfig = serde_json::from_str(r#"{"base_topic":"x","state_update":true}"#).unwrap();
        assert_eq!(config.base_topic, "x");
        assert!(config.state_update);
        assert_eq!(config.discovery_prefix, "homeassistant");
    }
}
