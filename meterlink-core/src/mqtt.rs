//! rumqttc-backed transport and event loop driver

use crate::error::TransportError;
use crate::transport::Transport;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const RECONNECT_PAUSE: Duration = Duration::from_secs(2);

/// Publishing half of an MQTT session
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttTransport {
    /// `connected` must be the flag handed to [`spawn_event_loop`]
    pub fn new(client: AsyncClient, connected: Arc<AtomicBool>) -> Self {
        Self { client, connected }
    }

    pub fn client(&self) -> &AsyncClient {
        &self.client
    }
}

impl Transport for MqttTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected);
        }
        self.client
            .publish(topic, QoS::AtMostOnce, retain, payload)
            .await
            .map_err(|e| TransportError::Rejected(e.to_string()))
    }
}

/// Message received on a subscribed topic
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// What the event loop reports to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Broker accepted the connection; subscriptions must be (re)issued
    Connected,
    Message(InboundMessage),
}

/// Drive `eventloop` until the receiver of `tx` goes away.
///
/// Keeps `connected` in sync with the session and pauses before polling again
/// after an error; rumqttc reconnects on the next poll. Forwarding never blocks
/// on the receiver.
pub fn spawn_event_loop(
    mut eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<LinkEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match eventloop.poll().await {
                Ok(event) => link_event(event, &connected),
                Err(e) => {
                    if connected.swap(false, Ordering::Relaxed) {
                        warn!("MQTT connection lost: {e}");
                    } else {
                        debug!("MQTT connect failed: {e}");
                    }
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                    None
                }
            };

            if let Some(event) = event {
                if tx.send(event).is_err() {
                    debug!("event receiver dropped, stopping MQTT loop");
                    break;
                }
            }
        }
        connected.store(false, Ordering::Relaxed);
    })
}

/// Track the session state and pick out what the owner needs to see
fn link_event(event: Event, connected: &AtomicBool) -> Option<LinkEvent> {
    match event {
        Event::Incoming(Incoming::ConnAck(ack)) => {
            info!(code = ?ack.code, "MQTT connected");
            connected.store(true, Ordering::Relaxed);
            Some(LinkEvent::Connected)
        }
        Event::Incoming(Incoming::Publish(p)) => Some(LinkEvent::Message(InboundMessage {
            topic: p.topic,
            payload: p.payload.to_vec(),
        })),
        Event::Incoming(Incoming::Disconnect) => {
            connected.store(false, Ordering::Relaxed);
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::{ConnAck, ConnectReturnCode, Publish};

    #[test]
    fn test_session_state_follows_connack_and_disconnect() {
        let connected = AtomicBool::new(false);

        let ack = Event::Incoming(Incoming::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)));
        assert_eq!(link_event(ack, &connected), Some(LinkEvent::Connected));
        assert!(connected.load(Ordering::Relaxed));

        assert_eq!(link_event(Event::Incoming(Incoming::PingResp), &connected), None);
        assert_eq!(link_event(Event::Incoming(Incoming::Disconnect), &connected), None);
        assert!(!connected.load(Ordering::Relaxed));
    }

    #[test]
    fn test_inbound_burst_is_queued_without_a_reader() {
        let connected = AtomicBool::new(true);
        let (tx, mut rx) = mpsc::unbounded_channel();

        for i in 0..500u32 {
            let publish = Publish::new("meterlink/source/reading", QoS::AtMostOnce, i.to_string());
            let event = link_event(Event::Incoming(Incoming::Publish(publish)), &connected).unwrap();
            tx.send(event).unwrap();
        }

        let mut received = 0;
        while let Ok(LinkEvent::Message(message)) = rx.try_recv() {
            assert_eq!(message.topic, "meterlink/source/reading");
            assert_eq!(message.payload, received.to_string().into_bytes());
            received += 1;
        }
        assert_eq!(received, 500);
    }
}
