//! Inbound data from the meter side

use crate::config::SourceTopics;
use meterlink_core::{AccountingSnapshot, HardwareStatus, InboundMessage, MeterReading, PriceSeries};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceUpdate {
    Reading(MeterReading),
    Prices(PriceSeries),
    Accounting(AccountingSnapshot),
    Hardware(HardwareStatus),
}

/// Decode a message received on one of the source topics.
///
/// `Ok(None)` when the topic is not a source topic.
pub fn parse(topics: &SourceTopics, message: &InboundMessage) -> Result<Option<SourceUpdate>, serde_json::Error> {
    let payload = message.payload.as_slice();
    let update = match message.topic.as_str() {
        t if t == topics.reading => SourceUpdate::Reading(serde_json::from_slice(payload)?),
        t if t == topics.prices => SourceUpdate::Prices(serde_json::from_slice(payload)?),
        t if t == topics.accounting => SourceUpdate::Accounting(serde_json::from_slice(payload)?),
        t if t == topics.hardware => SourceUpdate::Hardware(serde_json::from_slice(payload)?),
        _ => return Ok(None),
    };
    Ok(Some(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterlink_core::Tier;

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage { topic: topic.to_string(), payload: payload.as_bytes().to_vec() }
    }

    #[test]
    fn test_reading() {
        let topics = SourceTopics::default();
        let json = r#"{
            "tier": 3,
            "meter_id": "7359992890941742",
            "active_import_power": 1520.0,
            "phases": [{"voltage": 230.1}, {}, {}],
            "active_import_counter": 12001.5,
            "meter_timestamp": "2026-02-01T10:00:00Z"
        }"#;

        let Some(SourceUpdate::Reading(reading)) = parse(&topics, &message(&topics.reading, json)).unwrap() else {
            panic!("expected a reading");
        };
        assert_eq!(reading.tier, Tier::Three);
        assert_eq!(reading.phases[0].voltage, Some(230.1));
        assert_eq!(reading.active_import_counter, Some(12001.5));
        assert!(reading.meter_timestamp.is_some());
    }

    #[test]
    fn test_prices_accounting_and_hardware() {
        let topics = SourceTopics::default();

        let prices = parse(&topics, &message(&topics.prices, r#"{"currency":"NOK","values":[1.2,null,0.9]}"#));
        let Ok(Some(SourceUpdate::Prices(prices))) = prices else { panic!("expected prices") };
        assert_eq!(prices.value_for_hour(1), None);
        assert_eq!(prices.value_for_hour(2), Some(0.9));

        let accounting = parse(&topics, &message(&topics.accounting, r#"{"initialized":true,"peak_hours":3,"peaks":[512,498]}"#));
        let Ok(Some(SourceUpdate::Accounting(snapshot))) = accounting else { panic!("expected accounting") };
        assert!(snapshot.initialized);
        assert_eq!(snapshot.peaks, vec![512, 498]);

        let hardware = parse(
            &topics,
            &message(&topics.hardware, r#"{"vcc":3.29,"rssi":-71,"probes":[{"address":[40,255,0,0,0,0,0,1],"value":4.5}]}"#),
        );
        let Ok(Some(SourceUpdate::Hardware(status))) = hardware else { panic!("expected hardware") };
        assert_eq!(status.probes.len(), 1);
        assert!(!status.has_internal_temperature());
    }

    #[test]
    fn test_unknown_topic_and_malformed_payload() {
        let topics = SourceTopics::default();
        assert_eq!(parse(&topics, &message("somewhere/else", "{}")).unwrap(), None);
        assert!(parse(&topics, &message(&topics.reading, r#"{"tier":9}"#)).is_err());
        assert!(parse(&topics, &message(&topics.prices, "not json")).is_err());
    }
}
