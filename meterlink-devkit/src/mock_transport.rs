/*!
Mock transport for tests without a broker

Records every publication and can simulate a lost connection or a broker
rejecting publishes.
*/

use anyhow::Result;
use meterlink_core::{Transport, TransportError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct MockMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// In-memory stand-in for `MqttTransport`. Clones share the same recording.
#[derive(Clone)]
pub struct MockTransport {
    published: Arc<Mutex<Vec<MockMessage>>>,
    connected: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
    service_calls: Arc<AtomicUsize>,
}

impl MockTransport {
    /// A connected transport accepting every publish
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
            failing: Arc::new(AtomicBool::new(false)),
            service_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Make every following publish fail with `TransportError::Rejected`.
    /// Rejected messages are still recorded.
    pub fn fail_publishes(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn messages(&self) -> MutexGuard<'_, Vec<MockMessage>> {
        self.published.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn published_messages(&self) -> Vec<MockMessage> {
        self.messages().clone()
    }

    pub fn find_messages_by_topic(&self, topic: &str) -> Vec<MockMessage> {
        self.messages().iter().filter(|msg| msg.topic == topic).cloned().collect()
    }

    /// Discovery config messages, in publication order
    pub fn discovery_messages(&self) -> Vec<MockMessage> {
        self.messages().iter().filter(|msg| msg.topic.ends_with("/config")).cloned().collect()
    }

    /// Number of discovery messages whose topic contains `fragment`
    pub fn count_discovery(&self, fragment: &str) -> usize {
        self.discovery_messages().iter().filter(|msg| msg.topic.contains(fragment)).count()
    }

    /// Parse the last message published on `topic`
    pub fn get_last_json_message<T>(&self, topic: &str) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.find_messages_by_topic(topic).last() {
            Some(last) => Ok(Some(serde_json::from_str(&last.payload)?)),
            None => Ok(None),
        }
    }

    /// How often the publisher yielded to the transport
    pub fn service_calls(&self) -> usize {
        self.service_calls.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.messages().clear();
        self.service_calls.store(0, Ordering::Relaxed);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TransportError> {
        log::info!("📤 [MOCK] Published to {}: {} bytes", topic, payload.len());
        self.messages().push(MockMessage { topic: topic.to_string(), payload, retain });

        if !self.is_connected() {
            return Err(TransportError::Disconnected);
        }
        if self.failing.load(Ordering::Relaxed) {
            return Err(TransportError::Rejected("simulated broker rejection".to_string()));
        }
        Ok(())
    }

    async fn service(&self) {
        self.service_calls.fetch_add(1, Ordering::Relaxed);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_is_recorded() {
        let transport = MockTransport::new();
        transport.publish("ams/power", r#"{"active_import_power":12}"#.to_string(), false).await.unwrap();
        transport.publish("homeassistant/sensor/x_y/config", "{}".to_string(), true).await.unwrap();

        assert_eq!(transport.published_messages().len(), 2);
        assert_eq!(transport.discovery_messages().len(), 1);
        assert!(transport.discovery_messages()[0].retain);

        let parsed: Option<serde_json::Value> = transport.get_last_json_message("ams/power").unwrap();
        assert_eq!(parsed.unwrap()["active_import_power"], 12);
    }

    #[tokio::test]
    async fn test_simulated_failures() {
        let transport = MockTransport::new();
        transport.fail_publishes(true);
        let err = transport.publish("t", String::new(), false).await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));

        transport.set_connected(false);
        assert!(!transport.is_connected());
        assert_eq!(transport.publish("t", String::new(), false).await, Err(TransportError::Disconnected));
    }

    #[tokio::test]
    async fn test_clear_and_service_counter() {
        let transport = MockTransport::new();
        transport.service().await;
        transport.publish("t", String::new(), false).await.unwrap();
        assert_eq!(transport.service_calls(), 1);

        transport.clear();
        assert!(transport.published_messages().is_empty());
        assert_eq!(transport.service_calls(), 0);
    }
}
