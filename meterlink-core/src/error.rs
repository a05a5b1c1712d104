//! Error types returned by the publishing operations

/// Failures of the underlying message channel
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("MQTT channel is not connected")]
    Disconnected,
    #[error("MQTT publish rejected: {0}")]
    Rejected(String),
}

/// Why a publish operation did not complete.
///
/// Every variant is transient: the caller simply tries again on its next
/// natural trigger.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// No base topic configured, or the transport is not connected
    #[error("publisher not ready (no topic or not connected)")]
    NotReady,
    /// Wall clock is still before the minimum valid epoch
    #[error("wall clock not synchronized yet")]
    ClockNotSynced,
    /// Merge mode is on and the state update interval has not elapsed
    #[error("state update throttled")]
    Throttled,
    /// Nothing worth publishing (no current price, too few probes)
    #[error("no data to publish")]
    NoData,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}
