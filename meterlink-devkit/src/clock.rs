/*!
Manually driven clock
*/

use chrono::{DateTime, TimeZone, Utc};
use meterlink_core::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug)]
struct ClockState {
    now: DateTime<Utc>,
    uptime: Duration,
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { state: Arc::new(Mutex::new(ClockState { now, uptime: Duration::ZERO })) }
    }

    /// 2026-01-15 12:30 UTC, comfortably past any minimum valid epoch
    pub fn synced() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 0).single().unwrap_or_default())
    }

    /// The Unix epoch, as read by a device that has not synchronized yet
    pub fn unsynced() -> Self {
        Self::new(DateTime::<Utc>::default())
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move wall-clock and uptime forward together
    pub fn advance(&self, by: Duration) {
        let mut state = self.state();
        state.uptime += by;
        state.now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    /// Jump the wall clock without touching uptime
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.state().now = now;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::synced()
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.state().now
    }

    fn uptime(&self) -> Duration {
        self.state().uptime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_moves_both_clocks() {
        let clock = ManualClock::synced();
        let start = clock.now_utc();
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.uptime(), Duration::from_secs(90));
        assert_eq!((clock.now_utc() - start).num_seconds(), 90);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = ManualClock::unsynced();
        let other = clock.clone();
        other.set_now(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(clock.now_utc().timestamp(), other.now_utc().timestamp());
        assert_eq!(clock.uptime(), Duration::ZERO);
    }
}
