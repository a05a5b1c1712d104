//! Which payloads a reading produces
//!
//! [`plan`] is the pure part of the tiered dispatcher: it looks at a reading
//! (and the accounting snapshot, if any) and lists the publications in the
//! order they go out. The publisher executes the plan.

use crate::accounting::AccountingSnapshot;
use crate::reading::{MeterReading, Tier};
use crate::sensor::SensorGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    /// `/energy` counters
    Energy { export: bool },
    /// `/power` in the shape of `tier`
    Power { tier: Tier, export: bool },
    /// `/realtime` accounting figures
    Realtime { export: bool },
}

impl PublishAction {
    /// Sensor groups to announce before the payload goes out, in order
    pub fn groups(self) -> Vec<SensorGroup> {
        let (base, export_group, export) = match self {
            PublishAction::Energy { export } => (SensorGroup::Tier3Energy, SensorGroup::Tier3Export, export),
            PublishAction::Power { tier: Tier::One, .. } => return vec![SensorGroup::Tier1Power],
            PublishAction::Power { tier: Tier::Two | Tier::Three, export } => {
                (SensorGroup::Tier2Power, SensorGroup::Tier2Export, export)
            }
            PublishAction::Power { tier: Tier::Four, export } => {
                (SensorGroup::Tier4Power, SensorGroup::Tier4Export, export)
            }
            PublishAction::Realtime { export } => (SensorGroup::Realtime, SensorGroup::RealtimeExport, export),
        };
        if export {
            vec![base, export_group]
        } else {
            vec![base]
        }
    }
}

/// Publications for one reading: energy first, then power, then realtime.
///
/// Estimated counters are never published. A tier 4 reading announces export
/// sensors as soon as one phase exports; lower tiers look at the aggregate.
pub fn plan(reading: &MeterReading, accounting: Option<&AccountingSnapshot>) -> Vec<PublishAction> {
    let mut actions = Vec::with_capacity(3);

    if reading.tier >= Tier::Three && !reading.counter_estimated {
        actions.push(PublishAction::Energy { export: reading.has_export_counter() });
    }

    let export = match reading.tier {
        Tier::One => false,
        Tier::Two | Tier::Three => reading.exports_power(),
        Tier::Four => reading.exports_phase_power(),
    };
    actions.push(PublishAction::Power { tier: reading.tier, export });

    if let Some(snapshot) = accounting.filter(|a| a.initialized) {
        actions.push(PublishAction::Realtime { export: snapshot.has_production() });
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(tier: Tier) -> MeterReading {
        MeterReading { tier, active_import_power: Some(900.0), ..Default::default() }
    }

    #[test]
    fn test_tier1_is_power_only() {
        let actions = plan(&reading(Tier::One), None);
        assert_eq!(actions, vec![PublishAction::Power { tier: Tier::One, export: false }]);
        assert_eq!(actions[0].groups(), vec![SensorGroup::Tier1Power]);
    }

    #[test]
    fn test_tier3_publishes_energy_before_power() {
        let mut r = reading(Tier::Three);
        r.active_export_counter = Some(10.5);
        let actions = plan(&r, None);
        assert_eq!(
            actions,
            vec![
                PublishAction::Energy { export: true },
                PublishAction::Power { tier: Tier::Three, export: false },
            ]
        );
        assert_eq!(actions[0].groups(), vec![SensorGroup::Tier3Energy, SensorGroup::Tier3Export]);
        assert_eq!(actions[1].groups(), vec![SensorGroup::Tier2Power]);
    }

    #[test]
    fn test_estimated_counters_are_skipped() {
        let mut r = reading(Tier::Four);
        r.counter_estimated = true;
        let actions = plan(&r, None);
        assert_eq!(actions, vec![PublishAction::Power { tier: Tier::Four, export: false }]);
    }

    #[test]
    fn test_tier4_export_uses_phases() {
        let mut r = reading(Tier::Four);
        r.active_export_power = Some(500.0);
        assert_eq!(plan(&r, None)[1], PublishAction::Power { tier: Tier::Four, export: false });

        r.phases[1].active_export_power = Some(120.0);
        let power = plan(&r, None)[1];
        assert_eq!(power, PublishAction::Power { tier: Tier::Four, export: true });
        assert_eq!(power.groups(), vec![SensorGroup::Tier4Power, SensorGroup::Tier4Export]);
    }

    #[test]
    fn test_tier2_export_uses_aggregate() {
        let mut r = reading(Tier::Two);
        r.active_export_power = Some(42.0);
        let actions = plan(&r, None);
        assert_eq!(actions[0].groups(), vec![SensorGroup::Tier2Power, SensorGroup::Tier2Export]);
    }

    #[test]
    fn test_realtime_needs_initialized_accounting() {
        let mut snapshot = AccountingSnapshot::default();
        assert_eq!(plan(&reading(Tier::One), Some(&snapshot)).len(), 1);

        snapshot.initialized = true;
        snapshot.today.produced = 1.2;
        let actions = plan(&reading(Tier::One), Some(&snapshot));
        assert_eq!(actions.last(), Some(&PublishAction::Realtime { export: true }));
    }
}
