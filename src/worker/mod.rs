mod frequency;
mod stop_tree;
mod timetable;

pub use frequency::*;
pub use stop_tree::*;
pub use timetable::*;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::{
    model::TransitModel,
    shared::{
        geo::{Distance, Speed, walk_time},
        time::Duration,
    },
    window::TimeWindow,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transit model has no precomputed simple transfers, rebuild it with street linking")]
    MissingTransfers,
    #[error("Stop tree cache covers {got} stops but the model has {expected}")]
    StopTreeMismatch { expected: usize, got: usize },
}

/// A directed walking edge to another stop, with the walk already converted
/// to seconds under the search walk speed.
#[derive(Debug, Clone, Copy)]
pub struct TransferTarget {
    pub stop_idx: u32,
    pub duration: Duration,
}

/// A directed egress edge from a stop to an external target.
#[derive(Debug, Clone, Copy)]
pub struct EgressLink {
    pub target: u32,
    pub distance: Distance,
}

/// The flattened, read-only search graph built once per query.
///
/// Stop indices are the model's stop indices. Patterns are re-indexed
/// densely: a pattern with zero trips running inside the window is dropped
/// entirely, so a stop served only by dropped patterns keeps an empty
/// pattern list and is unreachable by transit. All adjacency is CSR-style
/// offset arrays for cache locality; nothing in here refers back to model
/// objects by pointer.
///
/// The data is safe to share read-only across threads, but
/// [`FrequencyOffsets`] snapshots are per-run and must not be shared.
#[derive(Debug, Clone)]
pub struct WorkerData {
    stop_count: usize,
    target_count: usize,

    /// Flattened ordered stop sequences of all kept patterns.
    pattern_stops: Box<[u32]>,
    /// Offsets into `pattern_stops`, one per kept pattern plus a tail.
    pattern_stops_index: Box<[u32]>,
    /// Model pattern behind each worker pattern.
    model_patterns: Box<[u32]>,
    /// Compacted timetable per kept pattern.
    timetables: Box<[PatternTimetable]>,

    /// Flattened worker-pattern lists per stop.
    stop_patterns: Box<[u32]>,
    stop_patterns_index: Box<[u32]>,

    /// Flattened transfer pairs per stop.
    transfers: Box<[TransferTarget]>,
    transfers_index: Box<[u32]>,

    /// Flattened egress pairs per stop.
    egress: Box<[EgressLink]>,
    egress_index: Box<[u32]>,
}

impl WorkerData {
    /// Builds the per-query search graph.
    ///
    /// Fails when the model carries no precomputed transfer data; running
    /// without it would silently return incomplete connectivity.
    pub fn build(
        model: &TransitModel,
        window: &TimeWindow,
        stop_tree: &StopTreeCache,
        walk_speed: Speed,
    ) -> Result<Self, Error> {
        let model_transfers = model.transfers.as_ref().ok_or(Error::MissingTransfers)?;
        let stop_count = model.stops.len();
        if stop_tree.stop_count() != stop_count {
            return Err(Error::StopTreeMismatch {
                expected: stop_count,
                got: stop_tree.stop_count(),
            });
        }

        // Compact every pattern against the window, dropping the empty ones.
        let compacted: Vec<(u32, PatternTimetable)> = model
            .patterns
            .par_iter()
            .filter_map(|pattern| {
                PatternTimetable::compact(model, pattern.index, window)
                    .map(|timetable| (pattern.index, timetable))
            })
            .collect();

        let mut pattern_stops: Vec<u32> = Vec::new();
        let mut pattern_stops_index: Vec<u32> = Vec::with_capacity(compacted.len() + 1);
        let mut model_patterns: Vec<u32> = Vec::with_capacity(compacted.len());
        let mut timetables: Vec<PatternTimetable> = Vec::with_capacity(compacted.len());
        let mut patterns_at_stop: Vec<Vec<u32>> = vec![Vec::new(); stop_count];

        pattern_stops_index.push(0);
        for (worker_idx, (model_idx, timetable)) in compacted.into_iter().enumerate() {
            let pattern = &model.patterns[model_idx as usize];
            for stop_idx in pattern.stops.iter() {
                pattern_stops.push(*stop_idx);
                let list = &mut patterns_at_stop[*stop_idx as usize];
                if list.last() != Some(&(worker_idx as u32)) {
                    list.push(worker_idx as u32);
                }
            }
            pattern_stops_index.push(pattern_stops.len() as u32);
            model_patterns.push(model_idx);
            timetables.push(timetable);
        }

        let mut stop_patterns: Vec<u32> = Vec::new();
        let mut stop_patterns_index: Vec<u32> = Vec::with_capacity(stop_count + 1);
        stop_patterns_index.push(0);
        for list in patterns_at_stop {
            stop_patterns.extend(list);
            stop_patterns_index.push(stop_patterns.len() as u32);
        }

        let mut transfers: Vec<TransferTarget> = Vec::new();
        let mut transfers_index: Vec<u32> = Vec::with_capacity(stop_count + 1);
        transfers_index.push(0);
        for stop_idx in 0..stop_count as u32 {
            for transfer_idx in model.transfers_for_stop(stop_idx) {
                let transfer = &model_transfers[*transfer_idx as usize];
                transfers.push(TransferTarget {
                    stop_idx: transfer.to_stop_idx,
                    duration: walk_time(transfer.distance, walk_speed),
                });
            }
            transfers_index.push(transfers.len() as u32);
        }

        let mut egress: Vec<EgressLink> = Vec::new();
        let mut egress_index: Vec<u32> = Vec::with_capacity(stop_count + 1);
        egress_index.push(0);
        for stop_idx in 0..stop_count as u32 {
            for (target, distance) in stop_tree.links_for_stop(stop_idx) {
                egress.push(EgressLink {
                    target: *target,
                    distance: *distance,
                });
            }
            egress_index.push(egress.len() as u32);
        }

        debug!(
            patterns = timetables.len(),
            dropped = model.patterns.len() - timetables.len(),
            stops = stop_count,
            targets = stop_tree.target_count(),
            "built worker data"
        );

        Ok(Self {
            stop_count,
            target_count: stop_tree.target_count(),
            pattern_stops: pattern_stops.into(),
            pattern_stops_index: pattern_stops_index.into(),
            model_patterns: model_patterns.into(),
            timetables: timetables.into(),
            stop_patterns: stop_patterns.into(),
            stop_patterns_index: stop_patterns_index.into(),
            transfers: transfers.into(),
            transfers_index: transfers_index.into(),
            egress: egress.into(),
            egress_index: egress_index.into(),
        })
    }

    pub const fn stop_count(&self) -> usize {
        self.stop_count
    }

    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn pattern_count(&self) -> usize {
        self.timetables.len()
    }

    /// The ordered stop sequence of a worker pattern.
    pub fn stops_of_pattern(&self, pattern: usize) -> &[u32] {
        let start = self.pattern_stops_index[pattern] as usize;
        let end = self.pattern_stops_index[pattern + 1] as usize;
        &self.pattern_stops[start..end]
    }

    /// The model pattern index behind a worker pattern.
    pub fn model_pattern(&self, pattern: usize) -> u32 {
        self.model_patterns[pattern]
    }

    pub fn timetable(&self, pattern: usize) -> &PatternTimetable {
        &self.timetables[pattern]
    }

    /// Worker patterns calling at a stop.
    pub fn patterns_at_stop(&self, stop_idx: u32) -> &[u32] {
        let start = self.stop_patterns_index[stop_idx as usize] as usize;
        let end = self.stop_patterns_index[stop_idx as usize + 1] as usize;
        &self.stop_patterns[start..end]
    }

    pub fn transfers_from(&self, stop_idx: u32) -> &[TransferTarget] {
        let start = self.transfers_index[stop_idx as usize] as usize;
        let end = self.transfers_index[stop_idx as usize + 1] as usize;
        &self.transfers[start..end]
    }

    pub fn egress_from(&self, stop_idx: u32) -> &[EgressLink] {
        let start = self.egress_index[stop_idx as usize] as usize;
        let end = self.egress_index[stop_idx as usize + 1] as usize;
        &self.egress[start..end]
    }
}
