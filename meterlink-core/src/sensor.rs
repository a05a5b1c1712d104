//! Sensor catalogs
//!
//! Each [`SensorGroup`] owns a fixed list of [`SensorDescriptor`]s. Sensors whose
//! cardinality is only known at runtime (peak ranks, price hours, temperature
//! probes) are produced by generator functions instead of living in a catalog.

use serde::Serialize;
use std::borrow::Cow;

/// Value payload topic suffixes, relative to the configured base topic
pub mod topics {
    pub const POWER: &str = "/power";
    pub const ENERGY: &str = "/energy";
    pub const REALTIME: &str = "/realtime";
    pub const TEMPERATURES: &str = "/temperatures";
    pub const PRICES: &str = "/prices";
    pub const STATE: &str = "/state";
}

/// Home Assistant sensor device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Current,
    Duration,
    Energy,
    Monetary,
    Power,
    PowerFactor,
    ReactivePower,
    SignalStrength,
    Temperature,
    Timestamp,
    Voltage,
}

/// Home Assistant sensor state class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

/// Unit of measurement, possibly resolved against the active currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Fixed(&'static str),
    /// The accounting currency, e.g. `NOK`
    Currency,
    /// Price per kWh in the price currency, e.g. `NOK/kWh`
    CurrencyPerKwh,
}

impl Unit {
    /// Resolve to the published unit string, empty for unitless sensors.
    ///
    /// `None` means the sensor cannot be announced: it is denominated in the
    /// accounting currency and none is known. Prices per kWh fall back to a
    /// bare `/kWh`.
    pub fn resolve(self, currency: Option<&str>) -> Option<String> {
        match self {
            Unit::None => Some(String::new()),
            Unit::Fixed(uom) => Some(uom.to_string()),
            Unit::Currency => currency.map(str::to_string),
            Unit::CurrencyPerKwh => Some(format!("{}/kWh", currency.unwrap_or_default())),
        }
    }
}

/// One announceable sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDescriptor {
    pub name: Cow<'static, str>,
    /// Topic suffix of the value payload carrying this sensor
    pub topic: &'static str,
    /// JSON path of the value inside the payload
    pub path: Cow<'static, str>,
    /// Seconds before Home Assistant marks the value unavailable
    pub ttl: u32,
    pub unit: Unit,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
}

const fn sensor(
    name: &'static str,
    topic: &'static str,
    path: &'static str,
    ttl: u32,
    unit: Unit,
    device_class: Option<DeviceClass>,
    state_class: Option<StateClass>,
) -> SensorDescriptor {
    SensorDescriptor {
        name: Cow::Borrowed(name),
        topic,
        path: Cow::Borrowed(path),
        ttl,
        unit,
        device_class,
        state_class,
    }
}

const POWER_TTL: u32 = 60;
const ENERGY_TTL: u32 = 4000;
const REALTIME_TTL: u32 = 60;
const PRICE_TTL: u32 = 4000;
const SYSTEM_TTL: u32 = 1800;
const TEMPERATURE_TTL: u32 = 900;

const W: Unit = Unit::Fixed("W");
const VAR: Unit = Unit::Fixed("VAr");
const A: Unit = Unit::Fixed("A");
const V: Unit = Unit::Fixed("V");
const KWH: Unit = Unit::Fixed("kWh");
const KVARH: Unit = Unit::Fixed("kVArh");

use topics::{ENERGY, POWER, PRICES, REALTIME, STATE, TEMPERATURES};
use DeviceClass as Dc;
use StateClass as Sc;

pub const TIER1_POWER: &[SensorDescriptor] = &[
    sensor("Active import", POWER, "active_import_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
];

pub const TIER2_POWER: &[SensorDescriptor] = &[
    sensor("Reactive import", POWER, "reactive_import_power", POWER_TTL, VAR, Some(Dc::ReactivePower), Some(Sc::Measurement)),
    sensor("L1 current", POWER, "l1_current", POWER_TTL, A, Some(Dc::Current), Some(Sc::Measurement)),
    sensor("L2 current", POWER, "l2_current", POWER_TTL, A, Some(Dc::Current), Some(Sc::Measurement)),
    sensor("L3 current", POWER, "l3_current", POWER_TTL, A, Some(Dc::Current), Some(Sc::Measurement)),
    sensor("L1 voltage", POWER, "l1_voltage", POWER_TTL, V, Some(Dc::Voltage), Some(Sc::Measurement)),
    sensor("L2 voltage", POWER, "l2_voltage", POWER_TTL, V, Some(Dc::Voltage), Some(Sc::Measurement)),
    sensor("L3 voltage", POWER, "l3_voltage", POWER_TTL, V, Some(Dc::Voltage), Some(Sc::Measurement)),
];

pub const TIER2_EXPORT: &[SensorDescriptor] = &[
    sensor("Active export", POWER, "active_export_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("Reactive export", POWER, "reactive_export_power", POWER_TTL, VAR, Some(Dc::ReactivePower), Some(Sc::Measurement)),
];

pub const TIER3_ENERGY: &[SensorDescriptor] = &[
    sensor("Accumulated active import", ENERGY, "active_import_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Accumulated reactive import", ENERGY, "reactive_import_counter", ENERGY_TTL, KVARH, None, Some(Sc::TotalIncreasing)),
    sensor("Meter timestamp", ENERGY, "meter_timestamp", ENERGY_TTL, Unit::None, Some(Dc::Timestamp), None),
];

pub const TIER3_EXPORT: &[SensorDescriptor] = &[
    sensor("Accumulated active export", ENERGY, "active_export_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Accumulated reactive export", ENERGY, "reactive_export_counter", ENERGY_TTL, KVARH, None, Some(Sc::TotalIncreasing)),
];

pub const TIER4_POWER: &[SensorDescriptor] = &[
    sensor("L1 active import", POWER, "l1_active_import_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("L2 active import", POWER, "l2_active_import_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("L3 active import", POWER, "l3_active_import_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("Power factor", POWER, "power_factor", POWER_TTL, Unit::None, Some(Dc::PowerFactor), Some(Sc::Measurement)),
    sensor("L1 power factor", POWER, "l1_power_factor", POWER_TTL, Unit::None, Some(Dc::PowerFactor), Some(Sc::Measurement)),
    sensor("L2 power factor", POWER, "l2_power_factor", POWER_TTL, Unit::None, Some(Dc::PowerFactor), Some(Sc::Measurement)),
    sensor("L3 power factor", POWER, "l3_power_factor", POWER_TTL, Unit::None, Some(Dc::PowerFactor), Some(Sc::Measurement)),
    sensor("L1 accumulated active import", POWER, "l1_active_import_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("L2 accumulated active import", POWER, "l2_active_import_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("L3 accumulated active import", POWER, "l3_active_import_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
];

pub const TIER4_EXPORT: &[SensorDescriptor] = &[
    sensor("L1 active export", POWER, "l1_active_export_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("L2 active export", POWER, "l2_active_export_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("L3 active export", POWER, "l3_active_export_power", POWER_TTL, W, Some(Dc::Power), Some(Sc::Measurement)),
    sensor("L1 accumulated active export", POWER, "l1_active_export_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("L2 accumulated active export", POWER, "l2_active_export_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("L3 accumulated active export", POWER, "l3_active_export_counter", ENERGY_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
];

pub const REALTIME_SENSORS: &[SensorDescriptor] = &[
    sensor("Current month max", REALTIME, "max", REALTIME_TTL, KWH, None, Some(Sc::Measurement)),
    sensor("Current tariff threshold", REALTIME, "threshold", REALTIME_TTL, KWH, None, Some(Sc::Measurement)),
    sensor("Used this hour", REALTIME, "hour.use", REALTIME_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Cost this hour", REALTIME, "hour.cost", REALTIME_TTL, Unit::Currency, Some(Dc::Monetary), Some(Sc::Total)),
    sensor("Used today", REALTIME, "day.use", REALTIME_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Cost today", REALTIME, "day.cost", REALTIME_TTL, Unit::Currency, Some(Dc::Monetary), Some(Sc::Total)),
    sensor("Used this month", REALTIME, "month.use", REALTIME_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Cost this month", REALTIME, "month.cost", REALTIME_TTL, Unit::Currency, Some(Dc::Monetary), Some(Sc::Total)),
];

pub const REALTIME_EXPORT_SENSORS: &[SensorDescriptor] = &[
    sensor("Produced this hour", REALTIME, "hour.produced", REALTIME_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Income this hour", REALTIME, "hour.income", REALTIME_TTL, Unit::Currency, Some(Dc::Monetary), Some(Sc::Total)),
    sensor("Produced today", REALTIME, "day.produced", REALTIME_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Income today", REALTIME, "day.income", REALTIME_TTL, Unit::Currency, Some(Dc::Monetary), Some(Sc::Total)),
    sensor("Produced this month", REALTIME, "month.produced", REALTIME_TTL, KWH, Some(Dc::Energy), Some(Sc::TotalIncreasing)),
    sensor("Income this month", REALTIME, "month.income", REALTIME_TTL, Unit::Currency, Some(Dc::Monetary), Some(Sc::Total)),
];

pub const PRICE_SENSORS: &[SensorDescriptor] = &[
    sensor("Minimum price ahead", PRICES, "prices.min", PRICE_TTL, Unit::CurrencyPerKwh, Some(Dc::Monetary), None),
    sensor("Maximum price ahead", PRICES, "prices.max", PRICE_TTL, Unit::CurrencyPerKwh, Some(Dc::Monetary), None),
    sensor("Cheapest 1hr period ahead", PRICES, "prices.cheapest1hr", PRICE_TTL, Unit::None, Some(Dc::Timestamp), None),
    sensor("Cheapest 3hr period ahead", PRICES, "prices.cheapest3hr", PRICE_TTL, Unit::None, Some(Dc::Timestamp), None),
    sensor("Cheapest 6hr period ahead", PRICES, "prices.cheapest6hr", PRICE_TTL, Unit::None, Some(Dc::Timestamp), None),
];

pub const SYSTEM_SENSORS: &[SensorDescriptor] = &[
    sensor("Uptime", STATE, "up", SYSTEM_TTL, Unit::Fixed("s"), Some(Dc::Duration), None),
    sensor("Supply volt", STATE, "vcc", SYSTEM_TTL, V, Some(Dc::Voltage), Some(Sc::Measurement)),
    sensor("WiFi RSSI", STATE, "rssi", SYSTEM_TTL, Unit::Fixed("dBm"), Some(Dc::SignalStrength), Some(Sc::Measurement)),
];

/// Statically cataloged sensor groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorGroup {
    Tier1Power,
    Tier2Power,
    Tier2Export,
    Tier3Energy,
    Tier3Export,
    Tier4Power,
    Tier4Export,
    Realtime,
    RealtimeExport,
    Price,
    System,
}

impl SensorGroup {
    pub const ALL: [SensorGroup; 11] = [
        SensorGroup::Tier1Power,
        SensorGroup::Tier2Power,
        SensorGroup::Tier2Export,
        SensorGroup::Tier3Energy,
        SensorGroup::Tier3Export,
        SensorGroup::Tier4Power,
        SensorGroup::Tier4Export,
        SensorGroup::Realtime,
        SensorGroup::RealtimeExport,
        SensorGroup::Price,
        SensorGroup::System,
    ];

    /// Groups that must be announced before this one
    pub fn prerequisites(self) -> &'static [SensorGroup] {
        match self {
            SensorGroup::Tier2Power => &[SensorGroup::Tier1Power],
            SensorGroup::Tier3Energy => &[SensorGroup::Tier2Power],
            SensorGroup::Tier4Power => &[SensorGroup::Tier3Energy],
            SensorGroup::Tier3Export => &[SensorGroup::Tier2Export],
            SensorGroup::Tier1Power
            | SensorGroup::Tier2Export
            | SensorGroup::Tier4Export
            | SensorGroup::Realtime
            | SensorGroup::RealtimeExport
            | SensorGroup::Price
            | SensorGroup::System => &[],
        }
    }

    pub fn catalog(self) -> &'static [SensorDescriptor] {
        match self {
            SensorGroup::Tier1Power => TIER1_POWER,
            SensorGroup::Tier2Power => TIER2_POWER,
            SensorGroup::Tier2Export => TIER2_EXPORT,
            SensorGroup::Tier3Energy => TIER3_ENERGY,
            SensorGroup::Tier3Export => TIER3_EXPORT,
            SensorGroup::Tier4Power => TIER4_POWER,
            SensorGroup::Tier4Export => TIER4_EXPORT,
            SensorGroup::Realtime => REALTIME_SENSORS,
            SensorGroup::RealtimeExport => REALTIME_EXPORT_SENSORS,
            SensorGroup::Price => PRICE_SENSORS,
            SensorGroup::System => SYSTEM_SENSORS,
        }
    }
}

/// Sensor for the `rank_index`-th (0-based) highest hour of the month
pub fn peak_sensor(rank_index: usize) -> SensorDescriptor {
    SensorDescriptor {
        name: Cow::Owned(format!("Current month peak {}", rank_index + 1)),
        topic: REALTIME,
        path: Cow::Owned(format!("peaks[{rank_index}]")),
        ttl: REALTIME_TTL,
        unit: KWH,
        device_class: None,
        state_class: Some(Sc::Measurement),
    }
}

/// Sensor for the price `hour` hours ahead; hour 0 is the current hour
pub fn price_hour_sensor(hour: usize) -> SensorDescriptor {
    let (name, state_class) = match hour {
        0 => ("Price current hour".to_string(), Some(Sc::Total)),
        1 => ("Price in 1 hour".to_string(), None),
        h => (format!("Price in {h} hours"), None),
    };
    SensorDescriptor {
        name: Cow::Owned(name),
        topic: PRICES,
        path: Cow::Owned(format!("prices['{hour}']")),
        ttl: PRICE_TTL,
        unit: Unit::CurrencyPerKwh,
        device_class: Some(Dc::Monetary),
        state_class,
    }
}

/// Temperature sensor; index 0 is the device's internal sensor on the state topic,
/// indices from 1 are external probes identified by their hex address
pub fn temperature_sensor(index: usize, address: &str) -> SensorDescriptor {
    let (name, topic, path) = if index == 0 {
        ("Temperature".to_string(), STATE, "temp".to_string())
    } else {
        (
            format!("Temperature sensor {address}"),
            TEMPERATURES,
            format!("temperatures['{address}']"),
        )
    };
    SensorDescriptor {
        name: Cow::Owned(name),
        topic,
        path: Cow::Owned(path),
        ttl: TEMPERATURE_TTL,
        unit: Unit::Fixed("°C"),
        device_class: Some(Dc::Temperature),
        state_class: Some(Sc::Measurement),
    }
}
