//! Price, temperature and device state publication

use meterlink_core::discovery::IndexedDomain;
use meterlink_core::sensor::topics;
use meterlink_core::{HardwareStatus, PublishError, SensorGroup};
use meterlink_devkit::fixtures::{hardware_status, price_series, probes};
use meterlink_devkit::TestHarness;
use serde_json::{json, Value};
use std::time::Duration;

fn sample_prices() -> Vec<Option<f64>> {
    vec![
        Some(10.0), Some(8.0), Some(8.0), Some(5.0), Some(20.0), Some(9.0),
        None, None, None, Some(1.0),
    ]
}

#[tokio::test]
async fn test_prices_payload_and_windows() {
    let mut harness = TestHarness::new();

    harness.publisher.publish_prices(&price_series("NOK", &sample_prices())).await.unwrap();

    let messages = harness.transport.find_messages_by_topic("ams/prices");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].retain);

    let payload = harness.last_payload(topics::PRICES).unwrap().unwrap();
    let prices = &payload["prices"];
    assert_eq!(payload["id"], "a1b2c3");
    assert_eq!(prices["0"], json!(10.0));
    assert_eq!(prices["6"], Value::Null);
    assert_eq!(prices["9"], json!(1.0));
    assert_eq!(prices["37"], Value::Null);
    assert_eq!(prices["min"], json!(5.0));
    assert_eq!(prices["max"], json!(20.0));
    // the clock reads 2026-01-15 12:30 UTC
    assert_eq!(prices["cheapest1hr"], "2026-01-15T15:00:00Z");
    assert_eq!(prices["cheapest3hr"], "2026-01-15T13:00:00Z");
    assert_eq!(prices["cheapest6hr"], "2026-01-15T12:00:00Z");
}

#[tokio::test]
async fn test_price_hours_are_announced_when_first_known() {
    let mut harness = TestHarness::new();

    harness.publisher.publish_prices(&price_series("NOK", &sample_prices())).await.unwrap();
    // 5 summary sensors + hours 0..=5 and 9
    assert_eq!(harness.transport.discovery_messages().len(), 12);
    assert!(harness.publisher.discovery().is_announced(SensorGroup::Price));
    assert!(harness.publisher.discovery().is_index_announced(IndexedDomain::PriceHour, 9));
    assert!(!harness.publisher.discovery().is_index_announced(IndexedDomain::PriceHour, 6));

    harness.publisher.publish_prices(&price_series("NOK", &sample_prices())).await.unwrap();
    assert_eq!(harness.transport.discovery_messages().len(), 12);

    // hour 6 shows up, hour 9 disappears: only hour 6 is new
    let mut later = sample_prices();
    later[6] = Some(7.5);
    later[9] = None;
    harness.clear();
    harness.publisher.publish_prices(&price_series("NOK", &later)).await.unwrap();
    let discovery = harness.transport.discovery_messages();
    assert_eq!(discovery.len(), 1);
    assert!(discovery[0].topic.ends_with("a1b2c3_prices6/config"));
}

#[tokio::test]
async fn test_prices_without_currency_still_announce_every_sensor() {
    let mut harness = TestHarness::new();
    let values = [Some(1.0), Some(2.0), Some(3.0)];

    harness.publisher.publish_prices(&price_series("", &values)).await.unwrap();
    let ids = harness.announced_ids().unwrap();
    assert_eq!(ids.len(), 8);
    for uid in ["a1b2c3_prices0", "a1b2c3_prices2", "a1b2c3_pricesmin", "a1b2c3_pricesmax"] {
        assert!(ids.iter().any(|id| id == uid), "{uid} not announced");
    }
    let current = harness
        .transport
        .discovery_messages()
        .into_iter()
        .find(|msg| msg.topic.ends_with("a1b2c3_prices0/config"))
        .unwrap();
    let current: Value = serde_json::from_str(&current.payload).unwrap();
    assert_eq!(current["unit_of_measurement"], "/kWh");

    // a currency showing up later changes nothing already announced
    harness.publisher.publish_prices(&price_series("NOK", &values)).await.unwrap();
    assert_eq!(harness.announced_ids().unwrap().len(), 8);
}

#[tokio::test]
async fn test_price_sensor_metadata() {
    let mut harness = TestHarness::new();
    harness.publisher.publish_prices(&price_series("EUR", &sample_prices())).await.unwrap();

    let config_of = |uid: &str| -> Value {
        let msg = harness
            .transport
            .discovery_messages()
            .into_iter()
            .find(|msg| msg.topic == format!("homeassistant/sensor/{uid}/config"))
            .unwrap();
        serde_json::from_str(&msg.payload).unwrap()
    };

    let current = config_of("a1b2c3_prices0");
    assert_eq!(current["name"], "Price current hour");
    assert_eq!(current["state_class"], "total");
    assert_eq!(current["unit_of_measurement"], "EUR/kWh");
    assert_eq!(current["value_template"], "{{ value_json.prices['0'] }}");

    let later = config_of("a1b2c3_prices3");
    assert_eq!(later["name"], "Price in 3 hours");
    assert!(later.get("state_class").is_none());

    let cheapest = config_of("a1b2c3_pricescheapest3hr");
    assert_eq!(cheapest["device_class"], "timestamp");
    assert_eq!(cheapest["value_template"], "{{ value_json.prices.cheapest3hr }}");
}

#[tokio::test]
async fn test_prices_without_current_hour_are_refused() {
    let mut harness = TestHarness::new();

    let err = harness.publisher.publish_prices(&price_series("NOK", &[None, Some(1.0)])).await.unwrap_err();
    assert!(matches!(err, PublishError::NoData));
    assert!(harness.transport.published_messages().is_empty());

    let err = harness.publisher.publish_prices(&price_series("NOK", &[])).await.unwrap_err();
    assert!(matches!(err, PublishError::NoData));
}

#[tokio::test]
async fn test_temperatures_need_two_probes() {
    let mut harness = TestHarness::new();

    let err = harness.publisher.publish_temperatures(&probes(1)).await.unwrap_err();
    assert!(matches!(err, PublishError::NoData));
    assert!(harness.transport.published_messages().is_empty());

    harness.publisher.publish_temperatures(&probes(3)).await.unwrap();
    assert_eq!(harness.transport.discovery_messages().len(), 3);
    for index in 1..=3 {
        assert!(harness.publisher.discovery().is_index_announced(IndexedDomain::Temperature, index));
    }

    let payload = harness.last_payload(topics::TEMPERATURES).unwrap().unwrap();
    assert_eq!(payload["temperatures"]["28ff4c6091160400"], json!(20.0));
    assert_eq!(payload["temperatures"]["28ff4c6091160402"], json!(20.5));

    harness.publisher.publish_temperatures(&probes(3)).await.unwrap();
    assert_eq!(harness.transport.discovery_messages().len(), 3);
}

#[tokio::test]
async fn test_system_state() {
    let mut harness = TestHarness::new();
    harness.clock.advance(Duration::from_secs(125));

    harness.publisher.publish_system(&hardware_status()).await.unwrap();

    // uptime, vcc, rssi + internal temperature
    assert_eq!(harness.transport.discovery_messages().len(), 4);
    assert_eq!(harness.transport.count_discovery("a1b2c3_temp/"), 1);

    let payload = harness.last_payload(topics::STATE).unwrap().unwrap();
    assert_eq!(
        payload,
        json!({
            "id": "a1b2c3",
            "name": "ams-a1b2c3",
            "up": 125,
            "vcc": 3.286,
            "rssi": -67,
            "temp": 38.46,
            "version": "2.4.0",
        })
    );
}

#[tokio::test]
async fn test_system_state_without_internal_sensor() {
    let mut harness = TestHarness::new();
    let status = HardwareStatus { vcc: 3.3, rssi: -50, ..Default::default() };

    harness.publisher.publish_system(&status).await.unwrap();

    assert_eq!(harness.transport.discovery_messages().len(), 3);
    assert!(!harness.publisher.discovery().is_index_announced(IndexedDomain::Temperature, 0));
}

#[tokio::test]
async fn test_online_reset_clears_indexed_announcements() {
    let mut harness = TestHarness::new();
    harness.publisher.publish_prices(&price_series("NOK", &sample_prices())).await.unwrap();
    harness.publisher.publish_temperatures(&probes(2)).await.unwrap();
    harness.publisher.publish_system(&hardware_status()).await.unwrap();
    let announced = harness.transport.discovery_messages().len();

    assert!(harness.publisher.on_message("homeassistant/status", b"online"));
    harness.clear();

    harness.publisher.publish_prices(&price_series("NOK", &sample_prices())).await.unwrap();
    harness.publisher.publish_temperatures(&probes(2)).await.unwrap();
    harness.publisher.publish_system(&hardware_status()).await.unwrap();
    assert_eq!(harness.transport.discovery_messages().len(), announced);
}
