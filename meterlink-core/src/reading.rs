//! Meter readings as delivered by the AMS decoder
//!
//! A reading is classified by its [`Tier`]: tier *n* carries every field of the
//! lower tiers plus its own. Fields the meter did not send are `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Data richness of a reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Active import power only
    #[default]
    One,
    /// Power, volt and amp
    Two,
    /// Tier 2 plus cumulative energy counters
    Three,
    /// Tier 3 plus per-phase power, power factor and counters
    Four,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("meter tier must be between 1 and 4, got {0}")]
pub struct InvalidTier(pub u8);

impl TryFrom<u8> for Tier {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            4 => Ok(Tier::Four),
            other => Err(InvalidTier(other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
            Tier::Four => 4,
        }
    }
}

/// Per-phase values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseValues {
    pub current: Option<f64>,
    pub voltage: Option<f64>,
    pub active_import_power: Option<f64>,
    pub active_export_power: Option<f64>,
    pub power_factor: Option<f64>,
    pub active_import_counter: Option<f64>,
    pub active_export_counter: Option<f64>,
}

impl PhaseValues {
    fn apply(&mut self, newer: &PhaseValues) {
        take_newer(&mut self.current, &newer.current);
        take_newer(&mut self.voltage, &newer.voltage);
        take_newer(&mut self.active_import_power, &newer.active_import_power);
        take_newer(&mut self.active_export_power, &newer.active_export_power);
        take_newer(&mut self.power_factor, &newer.power_factor);
        take_newer(&mut self.active_import_counter, &newer.active_import_counter);
        take_newer(&mut self.active_export_counter, &newer.active_export_counter);
    }
}

/// One decoded meter list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterReading {
    pub tier: Tier,
    pub list_id: Option<String>,
    pub meter_id: Option<String>,
    pub meter_model: Option<String>,
    /// Watts
    pub active_import_power: Option<f64>,
    pub reactive_import_power: Option<f64>,
    pub active_export_power: Option<f64>,
    pub reactive_export_power: Option<f64>,
    pub power_factor: Option<f64>,
    /// L1, L2, L3
    pub phases: [PhaseValues; 3],
    /// kWh
    pub active_import_counter: Option<f64>,
    pub active_export_counter: Option<f64>,
    pub reactive_import_counter: Option<f64>,
    pub reactive_export_counter: Option<f64>,
    pub meter_timestamp: Option<DateTime<Utc>>,
    /// Counters were extrapolated rather than read from the meter
    pub counter_estimated: bool,
}

fn take_newer<T: Clone>(slot: &mut Option<T>, newer: &Option<T>) {
    if newer.is_some() {
        slot.clone_from(newer);
    }
}

fn positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

impl MeterReading {
    /// Merge `newer` on top of this reading: its populated fields win, missing
    /// ones keep the current value. The merged tier is the highest of both.
    pub fn apply(&mut self, newer: &MeterReading) {
        self.tier = self.tier.max(newer.tier);
        take_newer(&mut self.list_id, &newer.list_id);
        take_newer(&mut self.meter_id, &newer.meter_id);
        take_newer(&mut self.meter_model, &newer.meter_model);
        take_newer(&mut self.active_import_power, &newer.active_import_power);
        take_newer(&mut self.reactive_import_power, &newer.reactive_import_power);
        take_newer(&mut self.active_export_power, &newer.active_export_power);
        take_newer(&mut self.reactive_export_power, &newer.reactive_export_power);
        take_newer(&mut self.power_factor, &newer.power_factor);
        for (phase, newer_phase) in self.phases.iter_mut().zip(&newer.phases) {
            phase.apply(newer_phase);
        }
        take_newer(&mut self.active_import_counter, &newer.active_import_counter);
        take_newer(&mut self.active_export_counter, &newer.active_export_counter);
        take_newer(&mut self.reactive_import_counter, &newer.reactive_import_counter);
        take_newer(&mut self.reactive_export_counter, &newer.reactive_export_counter);
        take_newer(&mut self.meter_timestamp, &newer.meter_timestamp);
        self.counter_estimated = newer.counter_estimated;
    }

    /// Aggregate active export power is strictly positive
    pub fn exports_power(&self) -> bool {
        positive(self.active_export_power)
    }

    /// Any phase reports strictly positive active export power
    pub fn exports_phase_power(&self) -> bool {
        self.phases.iter().any(|p| positive(p.active_export_power))
    }

    /// The active export counter is strictly positive
    pub fn has_export_counter(&self) -> bool {
        positive(self.active_export_counter)
    }
}
