use crate::analysis::types::{BalanceReading, NormalizedBalance, SideMetrics};

/// Resolve a polarity-tagged reading into left and right shares.
///
/// The shares are left unrounded so callers can average many samples before
/// rounding once.
pub fn split(reading: BalanceReading) -> (f64, f64) {
    match reading {
        BalanceReading::LeftReferenced(left) => (left, 100.0 - left),
        BalanceReading::RightReferenced(right) => (100.0 - right, right),
    }
}

/// Convert a raw reading into whole-percent left and right shares.
pub fn normalize(reading: BalanceReading) -> NormalizedBalance {
    let (left, right) = split(reading);
    NormalizedBalance {
        left: round_percent(left),
        right: round_percent(right),
    }
}

/// Round half away from zero; negative inputs clamp to zero.
pub(crate) fn round_percent(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Running left/right sums for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SideTotals {
    left: f64,
    right: f64,
    count: usize,
}

impl SideTotals {
    pub(crate) fn add(&mut self, left: f64, right: f64) {
        self.left += left;
        self.right += right;
        self.count += 1;
    }

    pub(crate) fn add_reading(&mut self, reading: BalanceReading) {
        let (left, right) = split(reading);
        self.add(left, right);
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    fn mean(&self) -> Option<(u32, u32)> {
        if self.count == 0 {
            return None;
        }
        let count = self.count as f64;
        Some((
            round_percent(self.left / count),
            round_percent(self.right / count),
        ))
    }

    pub(crate) fn balance(&self) -> Option<NormalizedBalance> {
        self.mean()
            .map(|(left, right)| NormalizedBalance { left, right })
    }

    pub(crate) fn metrics(&self) -> Option<SideMetrics> {
        self.mean().map(|(left, right)| SideMetrics { left, right })
    }
}
