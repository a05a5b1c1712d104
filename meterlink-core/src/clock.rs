use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Source of wall-clock and monotonic time for the publishers
pub trait Clock {
    /// Current wall-clock time
    fn now_utc(&self) -> DateTime<Utc>;
    /// Monotonic time elapsed since the process started
    fn uptime(&self) -> Duration;
}

/// Clock backed by the operating system
#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
