//! Device health as reported by the hardware collaborator

use serde::{Deserialize, Serialize};

/// Internal temperatures at or below this value mean "no sensor"
pub const INTERNAL_TEMPERATURE_FLOOR: f64 = -50.0;

fn no_temperature() -> f64 {
    -127.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareStatus {
    /// Supply voltage
    #[serde(default)]
    pub vcc: f64,
    /// WiFi signal strength, dBm
    #[serde(default)]
    pub rssi: i32,
    /// Internal temperature, °C
    #[serde(default = "no_temperature")]
    pub temperature: f64,
    /// External temperature probes
    #[serde(default)]
    pub probes: Vec<TemperatureProbe>,
}

impl Default for HardwareStatus {
    fn default() -> Self {
        Self {
            vcc: 0.0,
            rssi: 0,
            temperature: no_temperature(),
            probes: Vec::new(),
        }
    }
}

impl HardwareStatus {
    pub fn has_internal_temperature(&self) -> bool {
        self.temperature > INTERNAL_TEMPERATURE_FLOOR
    }
}

/// One external 1-Wire style probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureProbe {
    pub address: [u8; 8],
    pub value: f64,
}

impl TemperatureProbe {
    /// Address as 16 lowercase hex digits
    pub fn address_hex(&self) -> String {
        self.address.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex() {
        let probe = TemperatureProbe { address: [0x28, 0xff, 0x0a, 0, 1, 2, 3, 0xab], value: 21.5 };
        assert_eq!(probe.address_hex(), "28ff0a00010203ab");
    }

    #[test]
    fn test_missing_temperature_defaults_below_floor() {
        let status: HardwareStatus = serde_json::from_str(r#"{"vcc":3.3,"rssi":-60}"#).unwrap();
        assert!(!status.has_internal_temperature());
        assert!(status.probes.is_empty());
    }
}
