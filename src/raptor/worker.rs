use std::time::Instant;

use bitvec::prelude::*;
use tracing::{debug, trace};

use crate::{
    raptor::{Error, LabelPolicy, SearchConfig, propagation::propagate},
    shared::time::{self, Duration, Time},
    stats::PropagatedTimesStore,
    window::TimeWindow,
    worker::{Boarding, FrequencyOffsets, WorkerData},
};

/// The round-based label-correcting search engine.
///
/// One worker runs one departure time at a time over a fixed [`WorkerData`].
/// The label array survives between runs on purpose: the window driver scans
/// departure minutes backward, and labels from a later minute are feasible
/// (wait at the origin) and only improved by an earlier one. That reuse is
/// what makes the per-minute runs order-dependent and non-parallel.
pub struct RaptorWorker<'a> {
    data: &'a WorkerData,
    config: SearchConfig,
    /// Best known arrival per stop, `None` until reached.
    best_times: Vec<Option<Time>>,
    /// Stops improved since the last pattern collection.
    touched_stops: BitVec<usize, Lsb0>,
    /// Stops improved by riding in the current round.
    transit_touched: BitVec<usize, Lsb0>,
    /// Patterns to scan in the current round.
    touched_patterns: BitVec<usize, Lsb0>,
}

impl<'a> RaptorWorker<'a> {
    pub fn new(data: &'a WorkerData, config: SearchConfig) -> Self {
        Self {
            data,
            config,
            best_times: vec![None; data.stop_count()],
            touched_stops: bitvec!(usize, Lsb0; 0; data.stop_count()),
            transit_touched: bitvec!(usize, Lsb0; 0; data.stop_count()),
            touched_patterns: bitvec!(usize, Lsb0; 0; data.pattern_count()),
        }
    }

    pub fn best_times(&self) -> &[Option<Time>] {
        &self.best_times
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Clears all labels, making the next run independent of any earlier one.
    pub fn reset(&mut self) {
        self.best_times.fill(None);
        self.touched_stops.fill(false);
        self.transit_touched.fill(false);
        self.touched_patterns.fill(false);
    }

    /// One full multi-round search for a single departure time.
    ///
    /// `access` holds the initial walk times from the origin onto transit
    /// stops, as produced by the street router.
    pub fn run(
        &mut self,
        departure: Time,
        access: &[(u32, Duration)],
        offsets: &FrequencyOffsets,
    ) {
        let max_time = departure + self.config.max_duration;

        self.touched_stops.fill(false);
        for (stop_idx, access_time) in access {
            let stop = *stop_idx as usize;
            let arrival = departure + *access_time;
            if arrival <= max_time && improves(self.best_times[stop], arrival) {
                self.best_times[stop] = Some(arrival);
                self.touched_stops.set(stop, true);
            }
        }

        for round in 0..self.config.max_rounds {
            self.touched_patterns.fill(false);
            for stop in self.touched_stops.iter_ones() {
                for pattern in self.data.patterns_at_stop(stop as u32) {
                    self.touched_patterns.set(*pattern as usize, true);
                }
            }
            let pattern_count = self.touched_patterns.count_ones();
            if pattern_count == 0 {
                break;
            }
            debug!(round, patterns = pattern_count, "scanning round");

            self.touched_stops.fill(false);
            self.transit_touched.fill(false);

            // Ride every touched pattern down its stop sequence.
            for pattern in 0..self.data.pattern_count() {
                if !self.touched_patterns[pattern] {
                    continue;
                }
                self.scan_pattern(pattern, max_time, offsets);
            }

            // Walk transfers out of every stop the riding improved.
            for stop in self.transit_touched.iter_ones() {
                let Some(arrival) = self.best_times[stop] else {
                    continue;
                };
                for transfer in self.data.transfers_from(stop as u32) {
                    let target = transfer.stop_idx as usize;
                    let transferred = arrival + transfer.duration;
                    if transferred <= max_time && improves(self.best_times[target], transferred)
                    {
                        self.best_times[target] = Some(transferred);
                        self.touched_stops.set(target, true);
                    }
                }
            }

            // Both ride- and transfer-improved stops feed the next round.
            for stop in self.transit_touched.iter_ones() {
                self.touched_stops.set(stop, true);
            }
        }
    }

    /// Scans one pattern in stop order, maintaining the boarded vehicle.
    ///
    /// At every stop with a known arrival we check whether a vehicle
    /// departing at or after `arrival + board_slack` exists; if it leaves
    /// earlier than the one we are on, we step back onto it. The slack keeps
    /// us off vehicles that have technically already left.
    fn scan_pattern(&mut self, pattern: usize, max_time: Time, offsets: &FrequencyOffsets) {
        let stops = self.data.stops_of_pattern(pattern);
        let timetable = self.data.timetable(pattern);
        let freq_offsets = offsets.for_pattern(pattern);

        let mut onboard: Option<Boarding> = None;
        let mut board_pos = usize::MAX;

        for (pos, stop_idx) in stops.iter().enumerate() {
            let stop = *stop_idx as usize;

            if let Some(boarding) = onboard
                && pos > board_pos
            {
                let arrival = timetable.arrival_on(boarding, pos);
                if arrival <= max_time && improves(self.best_times[stop], arrival) {
                    trace!(stop, arrival = %arrival, "improved by ride");
                    self.best_times[stop] = Some(arrival);
                    self.transit_touched.set(stop, true);
                }
            }

            let Some(known) = self.best_times[stop] else {
                continue;
            };
            let board_after = known + self.config.board_slack;
            let current_departure = onboard
                .map(|boarding| timetable.departure_on(boarding, pos))
                .unwrap_or(time::MAX);
            if board_after > current_departure {
                continue;
            }

            let scheduled = timetable.next_scheduled_departure(pos, board_after);
            let frequency = timetable.next_frequency_departure(pos, board_after, freq_offsets);
            let candidate = match (scheduled, frequency) {
                (Some((row, departure)), Some((freq_row, vehicle_start, freq_departure))) => {
                    if freq_departure < departure {
                        Some((
                            Boarding::Frequency {
                                row: freq_row,
                                vehicle_start,
                            },
                            freq_departure,
                        ))
                    } else {
                        Some((Boarding::Scheduled { row }, departure))
                    }
                }
                (Some((row, departure)), None) => Some((Boarding::Scheduled { row }, departure)),
                (None, Some((freq_row, vehicle_start, freq_departure))) => Some((
                    Boarding::Frequency {
                        row: freq_row,
                        vehicle_start,
                    },
                    freq_departure,
                )),
                (None, None) => None,
            };
            if let Some((boarding, departure)) = candidate
                && departure < current_departure
            {
                onboard = Some(boarding);
                board_pos = pos;
            }
        }
    }

    /// Runs every departure minute of the window, newest first, and merges
    /// each minute's propagated target times into the store.
    ///
    /// Frequency offsets are re-rolled before every minute so the window
    /// forms a Monte Carlo sample of the unscheduled service. The deadline
    /// is cooperative: it is checked between minutes and aborts the whole
    /// search, never committing a partial minute.
    pub fn run_window(
        &mut self,
        window: &TimeWindow,
        access: &[(u32, Duration)],
        offsets: &mut FrequencyOffsets,
        policy: LabelPolicy,
        store: &mut PropagatedTimesStore,
        deadline: Option<Instant>,
    ) -> Result<(), Error> {
        if window.minutes() == 0 {
            return Err(Error::EmptyWindow);
        }
        if store.target_count() != self.data.target_count() {
            return Err(Error::TargetMismatch {
                expected: self.data.target_count(),
                got: store.target_count(),
            });
        }

        let has_frequencies = (0..self.data.pattern_count())
            .any(|pattern| !self.data.timetable(pattern).frequency_rows().is_empty());
        let mut minute_times: Vec<Option<Duration>> = vec![None; self.data.target_count()];

        for minute in (0..window.minutes()).rev() {
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                return Err(Error::Timeout);
            }
            if policy == LabelPolicy::Reset {
                self.reset();
            }
            if has_frequencies {
                offsets.roll(self.data);
            }
            let departure = window.from_time() + Duration::from_seconds(minute * 60);
            self.run(departure, access, offsets);
            propagate(
                self.data,
                &self.best_times,
                departure,
                self.config.walk_speed,
                self.config.max_duration,
                &mut minute_times,
            );
            store.merge(&minute_times);
        }
        Ok(())
    }
}

const fn improves(current: Option<Time>, candidate: Time) -> bool {
    match current {
        Some(best) => candidate.as_seconds() < best.as_seconds(),
        None => true,
    }
}

#[test]
fn improves_test() {
    let t = |s| Time::from_seconds(s);
    assert!(improves(None, t(100)));
    assert!(improves(Some(t(100)), t(99)));
    assert!(!improves(Some(t(100)), t(100)));
    assert!(!improves(Some(t(100)), t(101)));
}
