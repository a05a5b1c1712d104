//! Hourly price series and cheapest-window search
//!
//! The series starts at the current hour. A missing value ends the usable
//! prefix: windows are only searched over the contiguous run of known prices
//! starting at hour 0, even if later hours are known again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of hourly prices tracked ahead, current hour included
pub const PRICE_HOURS: usize = 38;

/// Window lengths, in hours, searched for the cheapest period
pub const WINDOW_LENGTHS: [usize; 3] = [1, 3, 6];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSeries {
    pub currency: String,
    /// Index 0 is the current hour; `None` marks an unknown hour
    pub values: Vec<Option<f64>>,
}

impl PriceSeries {
    /// Price `hour` hours ahead, if known
    pub fn value_for_hour(&self, hour: usize) -> Option<f64> {
        if hour >= PRICE_HOURS {
            return None;
        }
        self.values.get(hour).copied().flatten()
    }

    /// Currency, if the price source provided one
    pub fn currency(&self) -> Option<&str> {
        Some(self.currency.as_str()).filter(|c| !c.is_empty())
    }

    /// The full 38-hour view, unknown hours as `None`
    pub fn hours(&self) -> [Option<f64>; PRICE_HOURS] {
        std::array::from_fn(|hour| self.value_for_hour(hour))
    }
}

/// Cheapest window of a given length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowResult {
    pub hours: usize,
    /// Sum of the prices in the window
    pub cost: f64,
    /// Hours ahead of now at which the window starts
    pub start: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub cheapest_1h: Option<WindowResult>,
    pub cheapest_3h: Option<WindowResult>,
    pub cheapest_6h: Option<WindowResult>,
}

/// Known prices from hour 0 up to the first gap
fn contiguous_prefix(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().take(PRICE_HOURS).map_while(|v| *v).collect()
}

/// Earliest window of `hours` consecutive prices with the lowest sum
pub fn cheapest_window(prefix: &[f64], hours: usize) -> Option<WindowResult> {
    if hours == 0 || prefix.len() < hours {
        return None;
    }
    let mut best: Option<WindowResult> = None;
    for (start, window) in prefix.windows(hours).enumerate() {
        let cost: f64 = window.iter().sum();
        // strictly less: ties keep the earlier start
        if best.map_or(true, |b| cost < b.cost) {
            best = Some(WindowResult { hours, cost, start });
        }
    }
    best
}

/// Min, max and cheapest 1/3/6 hour windows of a price series
pub fn analyze(values: &[Option<f64>]) -> PriceSummary {
    let prefix = contiguous_prefix(values);
    let [one, three, six] = WINDOW_LENGTHS;
    PriceSummary {
        min: prefix.iter().copied().reduce(f64::min),
        max: prefix.iter().copied().reduce(f64::max),
        cheapest_1h: cheapest_window(&prefix, one),
        cheapest_3h: cheapest_window(&prefix, three),
        cheapest_6h: cheapest_window(&prefix, six),
    }
}

/// Start of the window as `YYYY-MM-DDTHH:00:00Z`, `start` hours after `now`
pub fn window_start_timestamp(now: DateTime<Utc>, start: usize) -> String {
    (now + Duration::hours(start as i64)).format("%Y-%m-%dT%H:00:00Z").to_string()
}
