//! Meterlink core - Home Assistant telemetry for AMS energy meters
//!
//! This crate turns meter readings into MQTT traffic understood by Home Assistant:
//! - Auto-discovery announcements, sent once per sensor until Home Assistant restarts
//! - Tiered value payloads (power, volt/amp, energy counters, per-phase detail)
//! - Realtime accounting figures (peaks, cost, income)
//! - Hourly prices with the cheapest 1/3/6 hour windows ahead
//! - Device state and temperature probes

pub mod accounting;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod hardware;
pub mod mqtt;
pub mod payload;
pub mod price;
pub mod publisher;
pub mod reading;
pub mod sensor;
pub mod transport;

pub use accounting::{AccountingSnapshot, PeriodFigures};
pub use clock::{Clock, SystemClock};
pub use config::HassConfig;
pub use discovery::{DeviceInfo, DiscoveryCache, DiscoveryMessage, DiscoveryPayload, IndexedDomain};
pub use dispatch::{plan, PublishAction};
pub use error::{PublishError, TransportError};
pub use hardware::{HardwareStatus, TemperatureProbe};
pub use mqtt::{spawn_event_loop, InboundMessage, LinkEvent, MqttTransport};
pub use price::{analyze, PriceSeries, PriceSummary, WindowResult};
pub use publisher::HassPublisher;
pub use reading::{MeterReading, PhaseValues, Tier};
pub use sensor::{SensorDescriptor, SensorGroup};
pub use transport::Transport;
