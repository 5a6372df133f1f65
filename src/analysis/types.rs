use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Raw left/right balance reading as delivered by the power meter.
///
/// FIT encodes the balance as a single percentage plus a flag telling which
/// leg that percentage belongs to. Only [`crate::analysis::balance`] looks
/// inside; everything else works with [`NormalizedBalance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceReading {
    /// The percentage is the left leg's share.
    LeftReferenced(f64),
    /// The percentage is the right leg's share.
    RightReferenced(f64),
}

impl BalanceReading {
    pub fn new(value: f64, right_is_reference: bool) -> Self {
        if right_is_reference {
            BalanceReading::RightReferenced(value)
        } else {
            BalanceReading::LeftReferenced(value)
        }
    }
}

/// One telemetry point from a `record` message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRecord {
    pub power: Option<u32>,
    pub balance: Option<BalanceReading>,
    pub left_torque_effectiveness: Option<f64>,
    pub right_torque_effectiveness: Option<f64>,
    pub left_pedal_smoothness: Option<f64>,
    pub right_pedal_smoothness: Option<f64>,
}

impl SampleRecord {
    /// Power in watts when the sample carries a positive reading.
    pub fn active_power(&self) -> Option<u32> {
        self.power.filter(|watts| *watts > 0)
    }

    pub fn torque_effectiveness(&self) -> Option<(f64, f64)> {
        both_sides(self.left_torque_effectiveness, self.right_torque_effectiveness)
    }

    pub fn pedal_smoothness(&self) -> Option<(f64, f64)> {
        both_sides(self.left_pedal_smoothness, self.right_pedal_smoothness)
    }
}

// A single-sided reading counts as no reading at all.
fn both_sides(left: Option<f64>, right: Option<f64>) -> Option<(f64, f64)> {
    match (left, right) {
        (Some(left), Some(right)) if left > 0.0 && right > 0.0 => Some((left, right)),
        _ => None,
    }
}

/// Values taken from the first `session` message of the activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub average_power: Option<f64>,
    pub threshold_power: Option<u32>,
    pub balance: Option<BalanceReading>,
}

/// Output of the decoder: every sample in file order plus the session summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedActivity {
    pub samples: Vec<SampleRecord>,
    pub session: Option<SessionSummary>,
}

/// Left/right split in whole percent. The two sides are rounded
/// independently, so they may sum to 99 or 101.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizedBalance {
    pub left: u32,
    pub right: u32,
}

/// Per-leg averages for torque effectiveness or pedal smoothness, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SideMetrics {
    pub left: u32,
    pub right: u32,
}

/// Watt band covered by a zone for a given threshold power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerRange {
    pub min_watts: u32,
    /// `None` for the open-ended top zone.
    pub max_watts: Option<u32>,
}

impl fmt::Display for PowerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_watts {
            Some(max) => write!(f, "{}-{}W", self.min_watts, max),
            None => write!(f, "{}+W", self.min_watts),
        }
    }
}

/// Averaged metrics for every sample that fell into one power zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerZoneAggregate {
    #[serde(rename = "zone")]
    pub zone_id: &'static str,
    #[serde(rename = "description")]
    pub label: &'static str,
    #[serde(rename = "powerRange", serialize_with = "serialize_power_range")]
    pub power_range: PowerRange,
    pub sample_count: usize,
    #[serde(rename = "leftRightBalance")]
    pub balance: NormalizedBalance,
    pub torque_effectiveness: Option<SideMetrics>,
    pub pedal_smoothness: Option<SideMetrics>,
}

fn serialize_power_range<S>(range: &PowerRange, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(range)
}

/// Whole-activity figures before zone aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityOverview {
    pub average_power: u32,
    pub threshold_power: Option<u32>,
    pub balance: Option<NormalizedBalance>,
    pub torque_effectiveness: Option<SideMetrics>,
    pub pedal_smoothness: Option<SideMetrics>,
}

/// Final result of analysing one activity file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerAnalysisResult {
    pub average_power: u32,
    pub threshold_power: Option<u32>,
    pub left_right_balance: Option<NormalizedBalance>,
    pub torque_effectiveness: Option<SideMetrics>,
    pub pedal_smoothness: Option<SideMetrics>,
    pub power_zone_balances: Vec<PowerZoneAggregate>,
}

impl PowerAnalysisResult {
    /// A decode that succeeded but carried no positive power samples.
    pub fn has_power_data(&self) -> bool {
        self.average_power > 0
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to decode FIT file: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sided_torque_is_not_a_reading() {
        let sample = SampleRecord {
            left_torque_effectiveness: Some(0.0),
            right_torque_effectiveness: Some(80.0),
            ..Default::default()
        };
        assert_eq!(sample.torque_effectiveness(), None);

        let sample = SampleRecord {
            left_pedal_smoothness: Some(22.5),
            ..Default::default()
        };
        assert_eq!(sample.pedal_smoothness(), None);
    }

    #[test]
    fn zero_power_is_inactive() {
        let sample = SampleRecord {
            power: Some(0),
            ..Default::default()
        };
        assert_eq!(sample.active_power(), None);
    }

    #[test]
    fn open_ended_range_renders_with_plus() {
        let bounded = PowerRange {
            min_watts: 110,
            max_watts: Some(150),
        };
        let open = PowerRange {
            min_watts: 240,
            max_watts: None,
        };
        assert_eq!(bounded.to_string(), "110-150W");
        assert_eq!(open.to_string(), "240+W");
    }
}
