//! Power zones as percentages of threshold power, and per-zone aggregation.
//!
//! Zone bounds are whole percentages, so classification is done in integer
//! arithmetic: `power * 100 >= min_percent * threshold` is exact where the
//! floating-point ratio is not.

use crate::analysis::balance::SideTotals;
use crate::analysis::types::{PowerRange, PowerZoneAggregate, SampleRecord};
use std::collections::BTreeMap;

/// Static description of one training zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZoneDefinition {
    pub id: &'static str,
    pub label: &'static str,
    /// Inclusive lower bound, percent of threshold power.
    pub min_percent: u32,
    /// Exclusive upper bound; `None` for the top zone.
    pub max_percent: Option<u32>,
}

impl ZoneDefinition {
    /// Whole-watt band for this zone at the given threshold.
    pub fn power_range(&self, threshold_power: u32) -> PowerRange {
        PowerRange {
            min_watts: watts_at(threshold_power, self.min_percent),
            max_watts: self
                .max_percent
                .map(|percent| watts_at(threshold_power, percent)),
        }
    }

    fn contains(&self, power: u32, threshold_power: u32) -> bool {
        let scaled = u64::from(power) * 100;
        let above_min = scaled >= u64::from(self.min_percent) * u64::from(threshold_power);
        let below_max = self
            .max_percent
            .is_none_or(|percent| scaled < u64::from(percent) * u64::from(threshold_power));
        above_min && below_max
    }
}

pub const ZONES: [ZoneDefinition; 6] = [
    ZoneDefinition {
        id: "Z1",
        label: "Active Recovery",
        min_percent: 0,
        max_percent: Some(55),
    },
    ZoneDefinition {
        id: "Z2",
        label: "Endurance",
        min_percent: 55,
        max_percent: Some(75),
    },
    ZoneDefinition {
        id: "Z3",
        label: "Tempo",
        min_percent: 75,
        max_percent: Some(90),
    },
    ZoneDefinition {
        id: "Z4",
        label: "Lactate Threshold",
        min_percent: 90,
        max_percent: Some(105),
    },
    ZoneDefinition {
        id: "Z5",
        label: "VO2 Max",
        min_percent: 105,
        max_percent: Some(120),
    },
    ZoneDefinition {
        id: "Z6",
        label: "Anaerobic/Neuromuscular",
        min_percent: 120,
        max_percent: None,
    },
];

// round(threshold * percent / 100), half up, saturating at u32::MAX.
fn watts_at(threshold_power: u32, percent: u32) -> u32 {
    let scaled = u64::from(threshold_power) * u64::from(percent);
    u32::try_from((scaled + 50) / 100).unwrap_or(u32::MAX)
}

/// Find the zone a power reading belongs to.
///
/// `threshold_power` must be positive; callers skip classification otherwise.
pub fn classify(power: u32, threshold_power: u32) -> &'static ZoneDefinition {
    ZONES
        .iter()
        .find(|zone| zone.contains(power, threshold_power))
        .unwrap_or(&ZONES[ZONES.len() - 1])
}

#[derive(Debug, Default)]
struct ZoneTotals {
    balance: SideTotals,
    torque: SideTotals,
    smoothness: SideTotals,
}

/// Group powered samples with a balance reading by zone and average them.
///
/// Torque effectiveness and pedal smoothness are accumulated for the same
/// samples but keep their own counts. Zones without any balance sample are
/// left out. The result is ordered Z1 to Z6.
pub fn aggregate_by_zone(
    samples: &[SampleRecord],
    threshold_power: Option<u32>,
) -> Vec<PowerZoneAggregate> {
    let Some(threshold_power) = threshold_power.filter(|watts| *watts > 0) else {
        return Vec::new();
    };

    let mut totals: BTreeMap<&'static ZoneDefinition, ZoneTotals> = BTreeMap::new();

    for sample in samples {
        let (Some(power), Some(reading)) = (sample.active_power(), sample.balance) else {
            continue;
        };

        let zone = totals
            .entry(classify(power, threshold_power))
            .or_default();
        zone.balance.add_reading(reading);

        if let Some((left, right)) = sample.torque_effectiveness() {
            zone.torque.add(left, right);
        }
        if let Some((left, right)) = sample.pedal_smoothness() {
            zone.smoothness.add(left, right);
        }
    }

    totals
        .into_iter()
        .filter_map(|(definition, zone)| {
            let balance = zone.balance.balance()?;
            Some(PowerZoneAggregate {
                zone_id: definition.id,
                label: definition.label,
                power_range: definition.power_range(threshold_power),
                sample_count: zone.balance.count(),
                balance,
                torque_effectiveness: zone.torque.metrics(),
                pedal_smoothness: zone.smoothness.metrics(),
            })
        })
        .collect()
}
