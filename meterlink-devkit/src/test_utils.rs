/*!
Test harness for the Home Assistant publisher

Wires a `HassPublisher` to a `MockTransport` and a `ManualClock`, and offers
assertions on what went out.
*/

use crate::clock::ManualClock;
use crate::fixtures::test_config;
use crate::mock_transport::MockTransport;
use anyhow::Result;
use meterlink_core::{HassConfig, HassPublisher};
use serde_json::Value;
use std::collections::HashMap;

pub struct TestHarness {
    pub publisher: HassPublisher<MockTransport, ManualClock>,
    pub transport: MockTransport,
    pub clock: ManualClock,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: HassConfig) -> Self {
        env_logger::try_init().ok();

        let transport = MockTransport::new();
        let clock = ManualClock::synced();
        let publisher = HassPublisher::with_clock(config, transport.clone(), clock.clone());
        Self { publisher, transport, clock }
    }

    /// Full topic of a value payload, e.g. `/power` -> `ams/power`
    pub fn topic(&self, suffix: &str) -> String {
        self.publisher.config().value_topic(suffix)
    }

    /// Last JSON payload published on a value topic suffix
    pub fn last_payload(&self, suffix: &str) -> Result<Option<Value>> {
        self.transport.get_last_json_message(&self.topic(suffix))
    }

    /// Number of messages published on a value topic suffix
    pub fn count(&self, suffix: &str) -> usize {
        self.transport.find_messages_by_topic(&self.topic(suffix)).len()
    }

    /// Unique ids of every discovery message sent so far
    pub fn announced_ids(&self) -> Result<Vec<String>> {
        self.transport
            .discovery_messages()
            .iter()
            .map(|msg| -> Result<String> {
                let payload: Value = serde_json::from_str(&msg.payload)?;
                Ok(payload["unique_id"].as_str().unwrap_or_default().to_string())
            })
            .collect()
    }

    /// Assert the field at a dotted path of the last payload on `suffix`
    pub fn assert_field_equals(&self, suffix: &str, field_path: &str, expected: &Value) -> Result<()> {
        let Some(msg) = self.last_payload(suffix)? else {
            anyhow::bail!("Nothing published on {}", self.topic(suffix));
        };
        match get_nested_field(&msg, field_path) {
            Some(actual) if actual == expected => {
                log::info!("✅ Field '{}' = {:?} in {}", field_path, expected, suffix);
                Ok(())
            }
            Some(actual) => {
                anyhow::bail!("Field '{}' mismatch: expected {:?}, got {:?}", field_path, expected, actual)
            }
            None => anyhow::bail!("Field '{}' not found in latest message on {}", field_path, suffix),
        }
    }

    /// Messages per topic
    pub fn topic_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for msg in self.transport.published_messages() {
            *counts.entry(msg.topic).or_insert(0) += 1;
        }
        counts
    }

    /// Forget recorded traffic; the publisher keeps its discovery state
    pub fn clear(&self) {
        self.transport.clear();
        log::info!("🧹 Recorded traffic cleared");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| match current {
        Value::Object(obj) => obj.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::reading;
    use meterlink_core::Tier;
    use serde_json::json;

    #[test]
    fn test_nested_field_lookup() {
        let value = json!({ "hour": { "use": 1.5 }, "peaks": [4.2, 3.9] });
        assert_eq!(get_nested_field(&value, "hour.use"), Some(&json!(1.5)));
        assert_eq!(get_nested_field(&value, "peaks.1"), Some(&json!(3.9)));
        assert!(get_nested_field(&value, "day.use").is_none());
    }

    #[tokio::test]
    async fn test_harness_records_publications() {
        let mut harness = TestHarness::new();
        harness.publisher.publish(&reading(Tier::One), None, None).await.unwrap();

        assert_eq!(harness.count("/power"), 1);
        harness.assert_field_equals("/power", "active_import_power", &json!(1843)).unwrap();
        assert_eq!(harness.announced_ids().unwrap(), vec!["a1b2c3_active_import_power"]);
        assert_eq!(harness.topic_counts().len(), 2);

        harness.clear();
        assert!(harness.transport.published_messages().is_empty());
    }
}
