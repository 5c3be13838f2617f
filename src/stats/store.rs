use serde::Serialize;
use tracing::debug;

use crate::{
    shared::time::Duration,
    stats::{LOWER_QUANTILE, SummaryStrategy, UPPER_QUANTILE, bootstrap_bounds, quantile},
};

/// Travel-time bounds for one target over the departure window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    /// Lower bound in seconds, per the chosen strategy.
    pub lower: u32,
    /// Integer mean over the reached minutes.
    pub avg: u32,
    /// Upper bound in seconds, per the chosen strategy.
    pub upper: u32,
    /// Number of departure minutes that reached the target.
    pub count: u32,
}

/// Accumulates per-target travel times across the repeated per-minute
/// searches of a window.
///
/// A target that no minute reaches has no statistics at all: it surfaces as
/// `None` in the summary, never as zero and never as some large stand-in
/// number.
#[derive(Debug, Clone)]
pub struct PropagatedTimesStore {
    target_count: usize,
    minutes_merged: u32,
    min: Vec<Option<u32>>,
    max: Vec<Option<u32>>,
    sum: Vec<u64>,
    count: Vec<u32>,
    /// Full per-target samples, needed by the percentile and bootstrap
    /// strategies.
    samples: Vec<Vec<u32>>,
}

impl PropagatedTimesStore {
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            minutes_merged: 0,
            min: vec![None; target_count],
            max: vec![None; target_count],
            sum: vec![0; target_count],
            count: vec![0; target_count],
            samples: vec![Vec::new(); target_count],
        }
    }

    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    pub const fn minutes_merged(&self) -> u32 {
        self.minutes_merged
    }

    /// Folds in one departure minute's per-target travel times.
    pub fn merge(&mut self, minute_times: &[Option<Duration>]) {
        debug_assert_eq!(minute_times.len(), self.target_count);
        for (target, time) in minute_times.iter().enumerate() {
            let Some(time) = time else {
                continue;
            };
            let seconds = time.as_seconds();
            self.min[target] = Some(match self.min[target] {
                Some(best) => best.min(seconds),
                None => seconds,
            });
            self.max[target] = Some(match self.max[target] {
                Some(worst) => worst.max(seconds),
                None => seconds,
            });
            self.sum[target] += seconds as u64;
            self.count[target] += 1;
            self.samples[target].push(seconds);
        }
        self.minutes_merged += 1;
    }

    /// Average travel time per target over the reached minutes.
    pub fn average(&self, target: usize) -> Option<Duration> {
        if self.count[target] == 0 {
            return None;
        }
        Some(Duration::from_seconds(
            (self.sum[target] / self.count[target] as u64) as u32,
        ))
    }

    /// Summarizes every target under the given strategy. Unreached targets
    /// come back as `None`.
    pub fn summarize(&self, strategy: SummaryStrategy) -> Vec<Option<TargetSummary>> {
        let summaries = (0..self.target_count)
            .map(|target| {
                if self.count[target] == 0 {
                    return None;
                }
                let avg = (self.sum[target] / self.count[target] as u64) as u32;
                let (lower, upper) = match strategy {
                    SummaryStrategy::MinMax => (
                        self.min[target].unwrap_or(avg),
                        self.max[target].unwrap_or(avg),
                    ),
                    SummaryStrategy::Percentile => {
                        let mut sorted = self.samples[target].clone();
                        sorted.sort_unstable();
                        (
                            quantile(&sorted, LOWER_QUANTILE),
                            quantile(&sorted, UPPER_QUANTILE),
                        )
                    }
                    SummaryStrategy::Bootstrap { iterations, seed } => {
                        bootstrap_bounds(&self.samples[target], iterations, seed)
                    }
                };
                Some(TargetSummary {
                    lower,
                    avg,
                    upper,
                    count: self.count[target],
                })
            })
            .collect();
        debug!(
            targets = self.target_count,
            minutes = self.minutes_merged,
            "summarized propagated times"
        );
        summaries
    }
}

#[test]
fn merge_and_summarize_test() {
    let mut store = PropagatedTimesStore::new(1);
    let d = |s| Some(Duration::from_seconds(s));
    store.merge(&[d(100)]);
    store.merge(&[d(120)]);
    store.merge(&[d(80)]);
    store.merge(&[None]);
    store.merge(&[d(110)]);

    let summary = store.summarize(SummaryStrategy::MinMax)[0].unwrap();
    assert_eq!(summary.lower, 80);
    assert_eq!(summary.upper, 120);
    assert_eq!(summary.avg, 102);
    assert_eq!(summary.count, 4);
    assert_eq!(store.minutes_merged(), 5);
}

#[test]
fn unreached_target_test() {
    let mut store = PropagatedTimesStore::new(2);
    store.merge(&[Some(Duration::from_seconds(0)), None]);

    let summary = store.summarize(SummaryStrategy::MinMax);
    // zero is a real travel time, absence is not
    let reached = summary[0].unwrap();
    assert_eq!(reached.lower, 0);
    assert_eq!(reached.count, 1);
    assert!(summary[1].is_none());
}
