//! Energy accounting snapshot supplied by the accounting collaborator

use serde::{Deserialize, Serialize};

/// Never publish more peak ranks than this, whatever the configured depth
pub const MAX_PUBLISHED_PEAKS: usize = 5;

/// Usage and money figures for one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodFigures {
    /// kWh imported
    pub used: f64,
    pub cost: f64,
    /// kWh exported
    pub produced: f64,
    pub income: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountingSnapshot {
    /// Accounting has enough history to be published
    pub initialized: bool,
    pub currency: Option<String>,
    /// Highest hourly usage this month, kWh
    pub month_max: f64,
    /// Current demand threshold, kWh
    pub threshold: u32,
    /// Configured number of tracked peak hours
    pub peak_hours: u8,
    /// Peak values in hundredths of a kWh, highest first
    pub peaks: Vec<u32>,
    pub this_hour: PeriodFigures,
    pub today: PeriodFigures,
    pub this_month: PeriodFigures,
}

impl AccountingSnapshot {
    /// Number of peak ranks to announce and publish
    pub fn published_peak_count(&self) -> usize {
        usize::from(self.peak_hours).min(MAX_PUBLISHED_PEAKS)
    }

    /// Peak value of a 0-based rank in kWh; 0 when the rank is not tracked yet
    pub fn peak_value(&self, rank_index: usize) -> f64 {
        self.peaks.get(rank_index).map_or(0.0, |&hundredths| f64::from(hundredths) / 100.0)
    }

    /// Any production this hour, today or this month
    pub fn has_production(&self) -> bool {
        self.this_hour.produced > 0.0 || self.today.produced > 0.0 || self.this_month.produced > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_count_is_capped() {
        let snapshot = AccountingSnapshot { peak_hours: 8, ..Default::default() };
        assert_eq!(snapshot.published_peak_count(), 5);
        let snapshot = AccountingSnapshot { peak_hours: 3, ..Default::default() };
        assert_eq!(snapshot.published_peak_count(), 3);
    }

    #[test]
    fn test_peak_value_scaling() {
        let snapshot = AccountingSnapshot { peaks: vec![523, 17], ..Default::default() };
        assert!((snapshot.peak_value(0) - 5.23).abs() < 1e-9);
        assert!((snapshot.peak_value(1) - 0.17).abs() < 1e-9);
        assert_eq!(snapshot.peak_value(4), 0.0);
    }

    #[test]
    fn test_production_detection() {
        let mut snapshot = AccountingSnapshot::default();
        assert!(!snapshot.has_production());
        snapshot.this_month.produced = 0.4;
        assert!(snapshot.has_production());
    }
}
