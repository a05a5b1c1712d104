use crate::error::TransportError;

/// Message channel the publishers write to.
///
/// Implemented by [`crate::MqttTransport`] in production and by the devkit's
/// mock in tests. Publications are fire-and-forget: `Ok` means the message was
/// handed to the channel, not that anyone received it.
#[allow(async_fn_in_trait)]
pub trait Transport {
    fn is_connected(&self) -> bool;

    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TransportError>;

    /// Let the channel make progress between bursts of publications
    async fn service(&self) {
        tokio::task::yield_now().await;
    }
}
