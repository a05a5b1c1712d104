//! Bridge configuration
//!
//! Loaded from the TOML file named by `METERLINK_CONFIG` (default
//! `meterlink.toml`). A missing file means defaults; every table is optional.

use anyhow::{Context, Result};
use meterlink_core::HassConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const CONFIG_ENV: &str = "METERLINK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "meterlink.toml";
/// Fallback for `[mqtt] password`, so the secret can live in `.env`
pub const PASSWORD_ENV: &str = "METERLINK_MQTT_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Period of the device state and temperature publication
    pub system_interval_secs: u64,
    pub mqtt: MqttConfig,
    pub hass: HassConfig,
    pub sources: SourceTopics,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            system_interval_secs: 60,
            mqtt: MqttConfig::default(),
            hass: HassConfig::default(),
            sources: SourceTopics::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Defaults to `hass.client_id`
    pub client_id: Option<String>,
    pub keep_alive_secs: u64,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: None,
            keep_alive_secs: 30,
            username: None,
            password: None,
        }
    }
}

/// Topics on which the meter side delivers its data, as JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceTopics {
    pub reading: String,
    pub prices: String,
    pub accounting: String,
    pub hardware: String,
}

impl Default for SourceTopics {
    fn default() -> Self {
        Self {
            reading: "meterlink/source/reading".to_string(),
            prices: "meterlink/source/prices".to_string(),
            accounting: "meterlink/source/accounting".to_string(),
            hardware: "meterlink/source/hardware".to_string(),
        }
    }
}

impl SourceTopics {
    pub fn all(&self) -> [&str; 4] {
        [self.reading.as_str(), self.prices.as_str(), self.accounting.as_str(), self.hardware.as_str()]
    }
}

impl BridgeConfig {
    /// Load from the path in `METERLINK_CONFIG`, or `meterlink.toml`
    pub async fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::load_from(&path).await?;
        if config.mqtt.password.is_none() {
            config.mqtt.password = std::env::var(PASSWORD_ENV).ok();
        }
        Ok(config)
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn client_id(&self) -> &str {
        self.mqtt.client_id.as_deref().unwrap_or(&self.hass.client_id)
    }

    /// Never shorter than a second
    pub fn system_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.system_interval_secs.max(1))
    }
}
