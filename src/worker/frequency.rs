use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{shared::time::Duration, worker::WorkerData};

/// Random phase offsets for headway-based service, one per frequency row of
/// each worker pattern.
///
/// A single roll represents one possible realization of the unscheduled
/// timetable; the window driver re-rolls before every simulated departure
/// minute so the minutes form a Monte Carlo sample. Offsets are owned by a
/// single search run and never shared across threads.
#[derive(Debug, Clone)]
pub struct FrequencyOffsets {
    offsets: Vec<Vec<Duration>>,
    rng: StdRng,
}

impl FrequencyOffsets {
    /// Zeroed offsets with a seeded generator. The seed is part of any test
    /// fixture that needs reproducible frequency behavior.
    pub fn new(data: &WorkerData, seed: u64) -> Self {
        let offsets = (0..data.pattern_count())
            .map(|pattern| {
                vec![Duration::default(); data.timetable(pattern).frequency_rows().len()]
            })
            .collect();
        Self {
            offsets,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Re-draws every offset uniformly in `[0, headway)`.
    pub fn roll(&mut self, data: &WorkerData) {
        for (pattern, row_offsets) in self.offsets.iter_mut().enumerate() {
            let rows = data.timetable(pattern).frequency_rows();
            for (offset, row) in row_offsets.iter_mut().zip(rows) {
                let headway = row.headway.as_seconds().max(1);
                *offset = Duration::from_seconds(self.rng.random_range(0..headway));
            }
        }
    }

    /// Half-headway offsets, the deterministic middle-of-the-wait
    /// realization used when randomization is switched off.
    pub fn center(&mut self, data: &WorkerData) {
        for (pattern, row_offsets) in self.offsets.iter_mut().enumerate() {
            let rows = data.timetable(pattern).frequency_rows();
            for (offset, row) in row_offsets.iter_mut().zip(rows) {
                *offset = Duration::from_seconds(row.headway.as_seconds() / 2);
            }
        }
    }

    pub fn for_pattern(&self, pattern: usize) -> &[Duration] {
        &self.offsets[pattern]
    }
}
