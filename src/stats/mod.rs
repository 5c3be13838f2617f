mod store;
pub use store::*;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::shared::time::Duration;

/// A compact summary of a distribution of travel or wait times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Seconds of the fastest observation.
    pub min: u32,
    /// Integer mean over the observations.
    pub avg: u32,
    /// Seconds of the slowest observation.
    pub max: u32,
    /// Number of observations behind the summary.
    pub count: u32,
}

impl Stats {
    /// The empty distribution.
    pub const fn new() -> Self {
        Self {
            min: 0,
            avg: 0,
            max: 0,
            count: 0,
        }
    }

    /// A single observation.
    pub const fn scalar(value: Duration) -> Self {
        let seconds = value.as_seconds();
        Self {
            min: seconds,
            avg: seconds,
            max: seconds,
            count: 1,
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = u32>) -> Self {
        let mut stats = Self::new();
        let mut sum: u64 = 0;
        for value in values {
            if stats.count == 0 {
                stats.min = value;
                stats.max = value;
            } else {
                stats.min = stats.min.min(value);
                stats.max = stats.max.max(value);
            }
            sum += value as u64;
            stats.count += 1;
        }
        if stats.count > 0 {
            stats.avg = (sum / stats.count as u64) as u32;
        }
        stats
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Shifts the whole distribution by a constant, e.g. appending a fixed
    /// walk leg to every observed journey.
    pub const fn add(&self, value: Duration) -> Self {
        if self.is_empty() {
            return *self;
        }
        let seconds = value.as_seconds();
        Self {
            min: self.min + seconds,
            avg: self.avg + seconds,
            max: self.max + seconds,
            count: self.count,
        }
    }

    /// Pools two distributions, weighting the mean by observation count.
    pub fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let count = self.count + other.count;
        let weighted =
            (self.avg as u64 * self.count as u64 + other.avg as u64 * other.count as u64)
                / count as u64;
        Self {
            min: self.min.min(other.min),
            avg: weighted as u32,
            max: self.max.max(other.max),
            count,
        }
    }

    /// Chains two consecutive legs: every observation of `self` is followed
    /// by an observation of `other`.
    pub fn then(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: self.min + other.min,
            avg: self.avg + other.avg,
            max: self.max + other.max,
            count: self.count.min(other.count),
        }
    }
}

/// How per-target bounds are derived from the per-minute sample.
///
/// `Percentile` takes order statistics directly off the observed sample and
/// describes the spread of individual journeys. `Bootstrap` resamples the
/// sample and describes confidence in the *mean*, which is the right
/// question for Monte-Carlo simulated frequency service. They answer
/// different statistical questions and are deliberately not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryStrategy {
    /// Literal extrema of the observed sample.
    MinMax,
    /// 2.5th / 97.5th percentiles of the observed sample.
    Percentile,
    /// Percentiles of the bootstrap-mean distribution.
    Bootstrap { iterations: u32, seed: u64 },
}

impl SummaryStrategy {
    /// Bootstrap with the conventional 400 resamples.
    pub const fn bootstrap(seed: u64) -> Self {
        Self::Bootstrap {
            iterations: 400,
            seed,
        }
    }
}

pub(crate) const LOWER_QUANTILE: f64 = 0.025;
pub(crate) const UPPER_QUANTILE: f64 = 0.975;

/// Nearest-rank quantile of an already sorted sample.
pub(crate) fn quantile(sorted: &[u32], q: f64) -> u32 {
    let index = (q * (sorted.len() - 1) as f64).round() as usize;
    sorted[index]
}

/// Bounds of the bootstrap-mean distribution: `iterations` resamples with
/// replacement, a mean per resample, then quantiles over those means.
pub(crate) fn bootstrap_bounds(sample: &[u32], iterations: u32, seed: u64) -> (u32, u32) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut means: Vec<u32> = (0..iterations)
        .map(|_| {
            let sum: u64 = (0..sample.len())
                .map(|_| sample[rng.random_range(0..sample.len())] as u64)
                .sum();
            (sum / sample.len() as u64) as u32
        })
        .collect();
    means.sort_unstable();
    (
        quantile(&means, LOWER_QUANTILE),
        quantile(&means, UPPER_QUANTILE),
    )
}

#[test]
fn from_values_test() {
    let stats = Stats::from_values([100, 120, 80, 110]);
    assert_eq!(stats.min, 80);
    assert_eq!(stats.max, 120);
    assert_eq!(stats.avg, 102);
    assert_eq!(stats.count, 4);
}

#[test]
fn add_shifts_bounds_test() {
    let stats = Stats::from_values([100, 200]).add(Duration::from_seconds(50));
    assert_eq!(stats.min, 150);
    assert_eq!(stats.max, 250);
    assert_eq!(stats.avg, 200);
    assert_eq!(stats.count, 2);
}

#[test]
fn merge_weights_by_count_test() {
    let a = Stats::from_values([100, 100, 100]);
    let b = Stats::from_values([200]);
    let merged = a.merge(&b);
    assert_eq!(merged.min, 100);
    assert_eq!(merged.max, 200);
    assert_eq!(merged.avg, 125);
    assert_eq!(merged.count, 4);
}

#[test]
fn merge_empty_test() {
    let a = Stats::new();
    let b = Stats::from_values([60]);
    assert_eq!(a.merge(&b), b);
    assert_eq!(b.merge(&a), b);
}

#[test]
fn quantile_test() {
    let sorted: Vec<u32> = (1..=100).collect();
    assert_eq!(quantile(&sorted, 0.0), 1);
    assert_eq!(quantile(&sorted, 1.0), 100);
    assert_eq!(quantile(&sorted, 0.5), 51);
}
