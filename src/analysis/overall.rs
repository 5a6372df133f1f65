use crate::analysis::balance::{SideTotals, normalize};
use crate::analysis::types::{ActivityOverview, NormalizedBalance, SampleRecord, SessionSummary};

/// Compute whole-activity figures, preferring the session summary.
///
/// Each figure is resolved on its own:
/// * average power comes from the session when it reports a positive value,
///   otherwise it is the mean of all samples with positive power;
/// * threshold power is only ever read from the session;
/// * balance uses the session reading when the session also supplied the
///   average power, otherwise it is averaged over powered samples;
/// * torque effectiveness and pedal smoothness are always averaged over the
///   samples that carry both sides.
pub fn aggregate(samples: &[SampleRecord], session: Option<&SessionSummary>) -> ActivityOverview {
    let session_power = session
        .and_then(|summary| summary.average_power)
        .filter(|watts| *watts > 0.0);

    let average_power = match session_power {
        Some(watts) => watts.round() as u32,
        None => mean_sample_power(samples),
    };

    let threshold_power = session
        .and_then(|summary| summary.threshold_power)
        .filter(|watts| *watts > 0);

    let session_balance = session_power
        .and(session.and_then(|summary| summary.balance))
        .map(normalize);
    let balance = session_balance.or_else(|| sample_balance(samples));

    let mut torque = SideTotals::default();
    let mut smoothness = SideTotals::default();
    for sample in samples {
        if let Some((left, right)) = sample.torque_effectiveness() {
            torque.add(left, right);
        }
        if let Some((left, right)) = sample.pedal_smoothness() {
            smoothness.add(left, right);
        }
    }

    ActivityOverview {
        average_power,
        threshold_power,
        balance,
        torque_effectiveness: torque.metrics(),
        pedal_smoothness: smoothness.metrics(),
    }
}

fn mean_sample_power(samples: &[SampleRecord]) -> u32 {
    let (total, count) = samples
        .iter()
        .filter_map(SampleRecord::active_power)
        .fold((0u64, 0u64), |(total, count), watts| {
            (total + u64::from(watts), count + 1)
        });

    if count == 0 {
        0
    } else {
        (total as f64 / count as f64).round() as u32
    }
}

fn sample_balance(samples: &[SampleRecord]) -> Option<NormalizedBalance> {
    let mut totals = SideTotals::default();
    for sample in samples {
        if let (Some(_), Some(reading)) = (sample.active_power(), sample.balance) {
            totals.add_reading(reading);
        }
    }
    totals.balance()
}
