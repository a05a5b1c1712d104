//! Value payloads published on the state topics
//!
//! Power is published in whole watts, other quantities rounded to a fixed
//! number of decimals. Fields the meter did not report are published as 0.

use crate::accounting::{AccountingSnapshot, PeriodFigures};
use crate::price::{window_start_timestamp, PriceSummary, WindowResult, PRICE_HOURS};
use crate::reading::{MeterReading, PhaseValues};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Round to `places` decimals
pub fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn watts(value: Option<f64>) -> i64 {
    value.unwrap_or(0.0).round() as i64
}

fn fixed(value: Option<f64>, places: i32) -> f64 {
    round(value.unwrap_or(0.0), places)
}

/// Tier 1 `/power`
#[derive(Debug, Serialize, PartialEq)]
pub struct BasicPower {
    pub active_import_power: i64,
}

impl From<&MeterReading> for BasicPower {
    fn from(reading: &MeterReading) -> Self {
        Self { active_import_power: watts(reading.active_import_power) }
    }
}

/// Tier 2 and 3 `/power`
#[derive(Debug, Serialize, PartialEq)]
pub struct ExtendedPower {
    pub list_id: String,
    pub meter_id: String,
    pub meter_model: String,
    pub active_import_power: i64,
    pub reactive_import_power: i64,
    pub active_export_power: i64,
    pub reactive_export_power: i64,
    pub l1_current: f64,
    pub l2_current: f64,
    pub l3_current: f64,
    pub l1_voltage: f64,
    pub l2_voltage: f64,
    pub l3_voltage: f64,
}

impl From<&MeterReading> for ExtendedPower {
    fn from(reading: &MeterReading) -> Self {
        let [l1, l2, l3] = &reading.phases;
        Self {
            list_id: reading.list_id.clone().unwrap_or_default(),
            meter_id: reading.meter_id.clone().unwrap_or_default(),
            meter_model: reading.meter_model.clone().unwrap_or_default(),
            active_import_power: watts(reading.active_import_power),
            reactive_import_power: watts(reading.reactive_import_power),
            active_export_power: watts(reading.active_export_power),
            reactive_export_power: watts(reading.reactive_export_power),
            l1_current: fixed(l1.current, 2),
            l2_current: fixed(l2.current, 2),
            l3_current: fixed(l3.current, 2),
            l1_voltage: fixed(l1.voltage, 2),
            l2_voltage: fixed(l2.voltage, 2),
            l3_voltage: fixed(l3.voltage, 2),
        }
    }
}

/// Tier 4 `/power`: the extended fields plus per-phase detail
#[derive(Debug, Serialize, PartialEq)]
pub struct DetailedPower {
    #[serde(flatten)]
    pub base: ExtendedPower,
    pub l1_active_import_power: i64,
    pub l2_active_import_power: i64,
    pub l3_active_import_power: i64,
    pub l1_active_export_power: i64,
    pub l2_active_export_power: i64,
    pub l3_active_export_power: i64,
    pub power_factor: f64,
    pub l1_power_factor: f64,
    pub l2_power_factor: f64,
    pub l3_power_factor: f64,
    pub l1_active_import_counter: f64,
    pub l2_active_import_counter: f64,
    pub l3_active_import_counter: f64,
    pub l1_active_export_counter: f64,
    pub l2_active_export_counter: f64,
    pub l3_active_export_counter: f64,
}

impl From<&MeterReading> for DetailedPower {
    fn from(reading: &MeterReading) -> Self {
        // a meter that reports no aggregate power factor gets 1 everywhere
        let unknown_pf = reading.power_factor.unwrap_or(0.0) == 0.0;
        let pf = |value: Option<f64>| if unknown_pf { 1.0 } else { fixed(value, 2) };
        let [l1, l2, l3]: &[PhaseValues; 3] = &reading.phases;
        Self {
            base: ExtendedPower::from(reading),
            l1_active_import_power: watts(l1.active_import_power),
            l2_active_import_power: watts(l2.active_import_power),
            l3_active_import_power: watts(l3.active_import_power),
            l1_active_export_power: watts(l1.active_export_power),
            l2_active_export_power: watts(l2.active_export_power),
            l3_active_export_power: watts(l3.active_export_power),
            power_factor: pf(reading.power_factor),
            l1_power_factor: pf(l1.power_factor),
            l2_power_factor: pf(l2.power_factor),
            l3_power_factor: pf(l3.power_factor),
            l1_active_import_counter: fixed(l1.active_import_counter, 3),
            l2_active_import_counter: fixed(l2.active_import_counter, 3),
            l3_active_import_counter: fixed(l3.active_import_counter, 3),
            l1_active_export_counter: fixed(l1.active_export_counter, 3),
            l2_active_export_counter: fixed(l2.active_export_counter, 3),
            l3_active_export_counter: fixed(l3.active_export_counter, 3),
        }
    }
}

/// Tier 3 `/energy`
#[derive(Debug, Serialize, PartialEq)]
pub struct EnergyCounters {
    pub active_import_counter: f64,
    pub active_export_counter: f64,
    pub reactive_import_counter: f64,
    pub reactive_export_counter: f64,
    pub meter_timestamp: Option<String>,
}

impl From<&MeterReading> for EnergyCounters {
    fn from(reading: &MeterReading) -> Self {
        Self {
            active_import_counter: fixed(reading.active_import_counter, 3),
            active_export_counter: fixed(reading.active_export_counter, 3),
            reactive_import_counter: fixed(reading.reactive_import_counter, 3),
            reactive_export_counter: fixed(reading.reactive_export_counter, 3),
            meter_timestamp: reading
                .meter_timestamp
                .map(|ts| ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PeriodPayload {
    #[serde(rename = "use")]
    pub used: f64,
    pub cost: f64,
    pub produced: f64,
    pub income: f64,
}

impl From<&PeriodFigures> for PeriodPayload {
    fn from(figures: &PeriodFigures) -> Self {
        Self {
            used: round(figures.used, 3),
            cost: round(figures.cost, 2),
            produced: round(figures.produced, 3),
            income: round(figures.income, 2),
        }
    }
}

/// `/realtime`
#[derive(Debug, Serialize, PartialEq)]
pub struct RealtimePayload {
    pub max: f64,
    pub peaks: Vec<f64>,
    pub threshold: u32,
    pub hour: PeriodPayload,
    pub day: PeriodPayload,
    pub month: PeriodPayload,
}

impl From<&AccountingSnapshot> for RealtimePayload {
    fn from(snapshot: &AccountingSnapshot) -> Self {
        Self {
            max: round(snapshot.month_max, 2),
            peaks: (0..snapshot.published_peak_count())
                .map(|rank| round(snapshot.peak_value(rank), 2))
                .collect(),
            threshold: snapshot.threshold,
            hour: PeriodPayload::from(&snapshot.this_hour),
            day: PeriodPayload::from(&snapshot.today),
            month: PeriodPayload::from(&snapshot.this_month),
        }
    }
}

/// Hourly prices keyed by hour index, followed by the summary fields.
///
/// Hours are serialized in index order with `null` for unknown hours.
#[derive(Debug, PartialEq)]
pub struct PriceTable {
    pub hours: [Option<f64>; PRICE_HOURS],
    pub min: f64,
    pub max: f64,
    pub cheapest1hr: String,
    pub cheapest3hr: String,
    pub cheapest6hr: String,
}

impl Serialize for PriceTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PRICE_HOURS + 5))?;
        for (hour, value) in self.hours.iter().enumerate() {
            map.serialize_entry(&hour.to_string(), &value.map(|v| round(v, 4)))?;
        }
        map.serialize_entry("min", &self.min)?;
        map.serialize_entry("max", &self.max)?;
        map.serialize_entry("cheapest1hr", &self.cheapest1hr)?;
        map.serialize_entry("cheapest3hr", &self.cheapest3hr)?;
        map.serialize_entry("cheapest6hr", &self.cheapest6hr)?;
        map.end()
    }
}

/// `/prices`
#[derive(Debug, Serialize, PartialEq)]
pub struct PricesPayload {
    pub id: String,
    pub prices: PriceTable,
}

impl PricesPayload {
    pub fn new(
        id: &str,
        hours: [Option<f64>; PRICE_HOURS],
        summary: &PriceSummary,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp = |window: Option<WindowResult>| {
            window.map(|w| window_start_timestamp(now, w.start)).unwrap_or_default()
        };
        Self {
            id: id.to_string(),
            prices: PriceTable {
                hours,
                min: round(summary.min.unwrap_or(0.0), 4),
                max: round(summary.max.unwrap_or(0.0), 4),
                cheapest1hr: timestamp(summary.cheapest_1h),
                cheapest3hr: timestamp(summary.cheapest_3h),
                cheapest6hr: timestamp(summary.cheapest_6h),
            },
        }
    }
}

/// `/temperatures`
#[derive(Debug, Serialize, PartialEq, Default)]
pub struct TemperaturesPayload {
    pub temperatures: BTreeMap<String, f64>,
}

/// `/state`
#[derive(Debug, Serialize, PartialEq)]
pub struct StatePayload {
    pub id: String,
    pub name: String,
    /// Seconds since start
    pub up: u64,
    pub vcc: f64,
    pub rssi: i32,
    pub temp: f64,
    pub version: String,
}
