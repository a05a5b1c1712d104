/*!
Ready-made inputs for publisher tests

Values are plausible for a Norwegian three-phase installation.
*/

use chrono::{TimeZone, Utc};
use meterlink_core::{
    AccountingSnapshot, HardwareStatus, HassConfig, MeterReading, PeriodFigures, PriceSeries, TemperatureProbe, Tier,
};

/// Publisher config used across tests: base topic `ams`, device id `a1b2c3`
pub fn test_config() -> HassConfig {
    HassConfig {
        base_topic: "ams".to_string(),
        client_id: "ams-a1b2c3".to_string(),
        device_id: "a1b2c3".to_string(),
        firmware_version: "2.4.0".to_string(),
        ..Default::default()
    }
}

/// Import-only reading populated up to `tier`
pub fn reading(tier: Tier) -> MeterReading {
    let mut reading = MeterReading { tier, active_import_power: Some(1843.0), ..Default::default() };
    if tier >= Tier::Two {
        reading.list_id = Some("AIDON_V0001".to_string());
        reading.meter_id = Some("7359992890941742".to_string());
        reading.meter_model = Some("6534".to_string());
        reading.reactive_import_power = Some(212.0);
        reading.active_export_power = Some(0.0);
        reading.reactive_export_power = Some(0.0);
        for (phase, (current, voltage)) in reading.phases.iter_mut().zip([(3.1, 231.2), (2.7, 229.8), (2.2, 232.5)]) {
            phase.current = Some(current);
            phase.voltage = Some(voltage);
        }
    }
    if tier >= Tier::Three {
        reading.active_import_counter = Some(45321.127);
        reading.active_export_counter = Some(0.0);
        reading.reactive_import_counter = Some(1532.4);
        reading.reactive_export_counter = Some(0.0);
        reading.meter_timestamp = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single();
    }
    if tier >= Tier::Four {
        reading.power_factor = Some(0.97);
        for (phase, power) in reading.phases.iter_mut().zip([712.0, 621.0, 510.0]) {
            phase.active_import_power = Some(power);
            phase.active_export_power = Some(0.0);
            phase.power_factor = Some(0.96);
            phase.active_import_counter = Some(15107.04);
            phase.active_export_counter = Some(0.0);
        }
    }
    reading
}

/// Same as [`reading`] with export values that turn the export sensors on
pub fn exporting_reading(tier: Tier) -> MeterReading {
    let mut reading = reading(tier);
    reading.active_export_power = Some(2210.0);
    reading.active_export_counter = Some(1204.5);
    reading.phases[0].active_export_power = Some(740.0);
    reading
}

/// Initialized accounting with `peak_hours` tracked peaks
pub fn accounting(peak_hours: u8, currency: Option<&str>) -> AccountingSnapshot {
    AccountingSnapshot {
        initialized: true,
        currency: currency.map(str::to_string),
        month_max: 6.42,
        threshold: 10,
        peak_hours,
        peaks: (0..u32::from(peak_hours)).map(|rank| 642 - rank * 37).collect(),
        this_hour: PeriodFigures { used: 0.912, cost: 1.38, ..Default::default() },
        today: PeriodFigures { used: 21.4, cost: 31.77, ..Default::default() },
        this_month: PeriodFigures { used: 402.3, cost: 598.1, ..Default::default() },
    }
}

/// [`accounting`] with production in the current month
pub fn producing_accounting(peak_hours: u8, currency: Option<&str>) -> AccountingSnapshot {
    let mut snapshot = accounting(peak_hours, currency);
    snapshot.this_month.produced = 12.6;
    snapshot.this_month.income = 7.1;
    snapshot
}

pub fn price_series(currency: &str, values: &[Option<f64>]) -> PriceSeries {
    PriceSeries { currency: currency.to_string(), values: values.to_vec() }
}

/// `count` external probes with distinct addresses
pub fn probes(count: usize) -> Vec<TemperatureProbe> {
    (0..count)
        .map(|i| TemperatureProbe {
            address: [0x28, 0xff, 0x4c, 0x60, 0x91, 0x16, 0x04, i as u8],
            value: 20.0 + i as f64 * 0.25,
        })
        .collect()
}

pub fn hardware_status() -> HardwareStatus {
    HardwareStatus { vcc: 3.2861, rssi: -67, temperature: 38.456, probes: Vec::new() }
}
