use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    model::TransitModel,
    profile::{
        Error, ProfileConfig,
        option::TripOption,
        ride::{PatternRide, RideArena},
        state::{ProfileState, RideId, StateArena, StateId},
    },
    shared::time::{Duration, Time},
    stats::Stats,
    window::TimeWindow,
    worker::{Boarding, PatternTimetable, WorkerData},
};

/// The round-based profile search.
///
/// Unlike [`crate::raptor::RaptorWorker`], which keeps only scalar arrival
/// times, this search carries full provenance: every state knows its
/// predecessor and the ride that produced it, so options with per-leg
/// statistics can be enumerated at the end. The price is a growing state
/// set, held in check by dominance pruning and ride grouping.
pub struct ProfileRouter<'a> {
    model: &'a TransitModel,
    data: &'a WorkerData,
    window: &'a TimeWindow,
    config: ProfileConfig,

    states: StateArena,
    rides: RideArena,
    /// Minimum upper bound seen at each stop, over all retained rounds.
    min_upper: Vec<Option<Duration>>,
    retained: Vec<StateId>,
}

/// Boardable service at one pattern position over the presence window.
struct BoardScan {
    /// Scheduled rows catchable inside the window, or the first row after
    /// it when the window itself is dry.
    rows: Vec<usize>,
    /// Frequency rows active during the window.
    freq_rows: Vec<usize>,
    wait: Stats,
}

impl<'a> ProfileRouter<'a> {
    pub fn new(
        model: &'a TransitModel,
        data: &'a WorkerData,
        window: &'a TimeWindow,
        config: ProfileConfig,
    ) -> Self {
        Self {
            model,
            data,
            window,
            config,
            states: StateArena::new(),
            rides: RideArena::new(),
            min_upper: vec![None; data.stop_count()],
            retained: Vec::new(),
        }
    }

    /// Runs the rounds and enumerates options for the destination.
    ///
    /// `access` holds walk times from the origin onto transit stops,
    /// `egress` walk times from transit stops to the destination.
    pub fn route(
        &mut self,
        access: &[(u32, Duration)],
        egress: &[(u32, Duration)],
    ) -> Result<Vec<TripOption>, Error> {
        if access.is_empty() {
            return Err(Error::EmptyAccess);
        }

        let mut frontier: Vec<StateId> = Vec::new();
        for (stop_idx, walk) in access {
            if *walk > self.config.cutoff {
                continue;
            }
            let id = self.states.push(ProfileState {
                stop: *stop_idx,
                lower: *walk,
                upper: *walk,
                previous: None,
                ride: None,
                patterns: Vec::new(),
                via_transfer: false,
            });
            self.note_upper(*stop_idx, *walk);
            frontier.push(id);
        }
        self.retained = frontier.clone();

        for round in 0..self.config.max_rounds {
            let fresh = self.board_round(round, &frontier);
            let survivors = self.prune_and_transfer(fresh);
            debug!(round, states = survivors.len(), "profile round done");
            if survivors.is_empty() {
                break;
            }
            self.retained.extend(survivors.iter().copied());
            frontier = survivors;

            // A later, tighter upper bound can retroactively dominate states
            // kept in earlier rounds.
            let mut retained = std::mem::take(&mut self.retained);
            retained.retain(|id| self.is_live(*id));
            self.retained = retained;
        }

        let mut options = self.collect_options(egress);
        options.sort_by_key(|option| option.sort_key());
        Ok(options)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn retained_states(&self) -> impl Iterator<Item = &ProfileState> {
        self.retained.iter().map(|id| self.states.get(*id))
    }

    /// Boards every pattern reachable from the frontier, grouping the new
    /// states by `(stop, ride)`.
    fn board_round(&mut self, round: usize, frontier: &[StateId]) -> Vec<StateId> {
        let mut fresh: HashMap<(u32, Option<RideId>), StateId> = HashMap::new();

        if round == 0 && self.config.first_round_single_boarding {
            // Branch control: board each pattern only from the state with
            // the earliest lower bound among those reaching it.
            let mut best_for_pattern: HashMap<u32, StateId> = HashMap::new();
            for id in frontier {
                let state = self.states.get(*id);
                for pattern in self.data.patterns_at_stop(state.stop) {
                    if state.rode(*pattern) {
                        continue;
                    }
                    best_for_pattern
                        .entry(*pattern)
                        .and_modify(|kept| {
                            if state.lower < self.states.get(*kept).lower {
                                *kept = *id;
                            }
                        })
                        .or_insert(*id);
                }
            }
            let mut boardings: Vec<(u32, StateId)> = best_for_pattern.into_iter().collect();
            boardings.sort_by_key(|(pattern, _)| *pattern);
            for (pattern, id) in boardings {
                self.board_pattern(pattern, id, &mut fresh);
            }
        } else {
            for id in frontier {
                let state = self.states.get(*id);
                let stop = state.stop;
                let mut patterns: Vec<u32> = self
                    .data
                    .patterns_at_stop(stop)
                    .iter()
                    .filter(|pattern| !self.states.get(*id).rode(**pattern))
                    .copied()
                    .collect();
                patterns.sort_unstable();
                for pattern in patterns {
                    self.board_pattern(pattern, *id, &mut fresh);
                }
            }
        }

        let mut fresh: Vec<StateId> = fresh.into_values().collect();
        fresh.sort_by_key(|id| id.0);
        fresh
    }

    /// Rides one pattern from a state, producing a candidate state at every
    /// downstream stop.
    fn board_pattern(
        &mut self,
        pattern: u32,
        from: StateId,
        fresh: &mut HashMap<(u32, Option<RideId>), StateId>,
    ) {
        let state = self.states.get(from).clone();
        let stops = self.data.stops_of_pattern(pattern as usize);
        let timetable = self.data.timetable(pattern as usize);
        let Some(board_pos) = stops.iter().position(|stop| *stop == state.stop) else {
            return;
        };

        let presence_lo = self.window.from_time() + state.lower + self.config.board_slack;
        let presence_hi = self.window.to_time() + state.upper + self.config.board_slack;
        let Some(scan) = scan_boardings(timetable, board_pos, presence_lo, presence_hi) else {
            return;
        };

        for alight_pos in board_pos + 1..stops.len() {
            let alight_stop = stops[alight_pos];
            let ride_stats = ride_stats(timetable, &scan, board_pos, alight_pos);
            if ride_stats.is_empty() {
                continue;
            }

            let lower =
                state.lower + self.config.board_slack + seconds(scan.wait.min + ride_stats.min);
            let upper =
                state.upper + self.config.board_slack + seconds(scan.wait.max + ride_stats.max);
            if lower > self.config.cutoff {
                continue;
            }

            let ride_id = self.rides.intern(
                state.stop,
                alight_stop,
                state.ride,
                PatternRide {
                    pattern,
                    board_pos,
                    alight_pos,
                },
                scan.wait,
                ride_stats,
            );

            let mut patterns = state.patterns.clone();
            if let Err(at) = patterns.binary_search(&pattern) {
                patterns.insert(at, pattern);
            }
            let candidate = ProfileState {
                stop: alight_stop,
                lower,
                upper,
                previous: Some(from),
                ride: Some(ride_id),
                patterns,
                via_transfer: false,
            };

            if let Some(existing) = fresh.get(&(alight_stop, Some(ride_id))).copied() {
                self.states.get_mut(existing).absorb(&candidate);
            } else {
                trace!(stop = alight_stop, pattern, "new profile state");
                let id = self.states.push(candidate);
                fresh.insert((alight_stop, Some(ride_id)), id);
            }
        }
    }

    /// Dominance-prunes the round's states, then spreads the survivors over
    /// walking transfers and prunes again.
    fn prune_and_transfer(&mut self, fresh: Vec<StateId>) -> Vec<StateId> {
        for id in &fresh {
            let state = self.states.get(*id);
            let (stop, upper) = (state.stop, state.upper);
            self.note_upper(stop, upper);
        }
        let mut survivors: Vec<StateId> = fresh
            .into_iter()
            .filter(|id| self.is_live(*id))
            .collect();

        let mut transferred: Vec<StateId> = Vec::new();
        for id in &survivors {
            let state = self.states.get(*id).clone();
            if state.via_transfer {
                continue;
            }
            for transfer in self.data.transfers_from(state.stop) {
                let lower = state.lower + transfer.duration;
                let upper = state.upper + transfer.duration;
                if lower > self.config.cutoff {
                    continue;
                }
                let candidate = ProfileState {
                    stop: transfer.stop_idx,
                    lower,
                    upper,
                    previous: Some(*id),
                    ride: state.ride,
                    patterns: state.patterns.clone(),
                    via_transfer: true,
                };
                self.note_upper(transfer.stop_idx, upper);
                transferred.push(self.states.push(candidate));
            }
        }
        survivors.extend(transferred);
        survivors.retain(|id| self.is_live(*id));
        survivors
    }

    fn note_upper(&mut self, stop: u32, upper: Duration) {
        let slot = &mut self.min_upper[stop as usize];
        match slot {
            Some(bound) if *bound <= upper => {}
            _ => *slot = Some(upper),
        }
    }

    /// A state survives while its lower bound beats the best upper bound at
    /// its stop and stays inside the absolute cutoff.
    fn is_live(&self, id: StateId) -> bool {
        let state = self.states.get(id);
        if state.lower > self.config.cutoff {
            return false;
        }
        self.min_upper[state.stop as usize]
            .map(|bound| state.lower <= bound)
            .unwrap_or(true)
    }

    /// Builds a [`TripOption`] for every retained state that can walk to the
    /// destination.
    fn collect_options(&self, egress: &[(u32, Duration)]) -> Vec<TripOption> {
        let egress_by_stop: HashMap<u32, Duration> = egress.iter().copied().collect();
        let mut options: Vec<TripOption> = Vec::new();
        for id in &self.retained {
            let state = self.states.get(*id);
            let Some(walk) = egress_by_stop.get(&state.stop) else {
                continue;
            };
            options.push(self.build_option(*id, *walk));
        }
        options
    }

    fn build_option(&self, id: StateId, egress_walk: Duration) -> TripOption {
        let mut segments: Vec<Stats> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut rides = 0u32;

        let mut current = id;
        loop {
            let state = self.states.get(current);
            let Some(previous) = state.previous else {
                // the access walk
                segments.push(Stats::scalar(state.lower));
                break;
            };
            let parent = self.states.get(previous);
            if state.ride != parent.ride
                && let Some(ride_id) = state.ride
            {
                let ride = self.rides.get(ride_id);
                segments.push(ride.wait.then(&ride.ride));
                names.push(self.ride_name(ride.pattern_rides.as_slice()));
                rides += 1;
            } else {
                // a transfer walk, recovered from the bound delta
                segments.push(Stats::scalar(state.lower - parent.lower));
            }
            current = previous;
        }

        let mut stats = Stats::new();
        for segment in segments.iter().rev() {
            stats = stats.then(segment);
        }
        stats = stats.add(egress_walk);

        names.reverse();
        let summary = if names.is_empty() {
            "walk".to_owned()
        } else {
            names.join(" -> ")
        };
        TripOption {
            summary,
            stats,
            transfers: rides.saturating_sub(1),
        }
    }

    fn ride_name(&self, pattern_rides: &[PatternRide]) -> String {
        let mut routes: Vec<&str> = pattern_rides
            .iter()
            .map(|pr| {
                let model_pattern = self.data.model_pattern(pr.pattern as usize);
                self.model.patterns[model_pattern as usize].route_id.as_ref()
            })
            .collect();
        routes.sort_unstable();
        routes.dedup();
        routes.join("/")
    }
}

/// Finds what can be boarded at `board_pos` while present during
/// `[presence_lo, presence_hi]`, and the wait-time spread over that window.
fn scan_boardings(
    timetable: &PatternTimetable,
    board_pos: usize,
    presence_lo: Time,
    presence_hi: Time,
) -> Option<BoardScan> {
    let mut in_window: Vec<(usize, Time)> = Vec::new();
    let mut fallback: Option<(usize, Time)> = None;
    for row in 0..timetable.trip_count() {
        let departure = timetable.departure(row, board_pos);
        if departure < presence_lo {
            continue;
        }
        if departure <= presence_hi {
            in_window.push((row, departure));
        } else {
            match fallback {
                Some((_, best)) if best <= departure => {}
                _ => fallback = Some((row, departure)),
            }
        }
    }
    in_window.sort_by_key(|(_, departure)| *departure);

    let freq_rows: Vec<usize> = timetable
        .frequency_rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.end > presence_lo && row.start < presence_hi)
        .map(|(idx, _)| idx)
        .collect();

    let wait = if !in_window.is_empty() {
        // Best case the departure minute lines up with a vehicle; worst case
        // we just missed one and sit out the largest gap observed in the
        // window.
        let mut worst = (in_window[0].1 - presence_lo).as_seconds();
        for pair in in_window.windows(2) {
            worst = worst.max((pair[1].1 - pair[0].1).as_seconds());
        }
        if let Some((_, departure)) = fallback {
            worst = worst.max((departure - in_window[in_window.len() - 1].1).as_seconds());
        }
        Stats {
            min: 0,
            avg: worst / 2,
            max: worst,
            count: in_window.len() as u32,
        }
    } else if let Some((_, departure)) = fallback {
        // Nothing inside the window; everyone waits for the same vehicle.
        let min = (departure - presence_hi).as_seconds();
        let max = (departure - presence_lo).as_seconds();
        Stats {
            min,
            avg: (min + max) / 2,
            max,
            count: 1,
        }
    } else if !freq_rows.is_empty() {
        let worst = freq_rows
            .iter()
            .map(|idx| timetable.frequency_rows()[*idx].headway.as_seconds())
            .max()
            .unwrap_or(0);
        Stats {
            min: 0,
            avg: worst / 2,
            max: worst,
            count: freq_rows.len() as u32,
        }
    } else {
        return None;
    };

    let rows: Vec<usize> = if !in_window.is_empty() {
        in_window.into_iter().map(|(row, _)| row).collect()
    } else {
        fallback.into_iter().map(|(row, _)| row).collect()
    };
    if rows.is_empty() && freq_rows.is_empty() {
        return None;
    }
    Some(BoardScan {
        rows,
        freq_rows,
        wait,
    })
}

/// In-vehicle time distribution between two positions, over every boardable
/// vehicle of the scan.
fn ride_stats(
    timetable: &PatternTimetable,
    scan: &BoardScan,
    board_pos: usize,
    alight_pos: usize,
) -> Stats {
    let scheduled = scan.rows.iter().map(|row| {
        (timetable.arrival(*row, alight_pos) - timetable.departure(*row, board_pos)).as_seconds()
    });
    let frequency = scan.freq_rows.iter().map(|row| {
        let boarding = Boarding::Frequency {
            row: *row,
            vehicle_start: Time::from_seconds(0),
        };
        (timetable.arrival_on(boarding, alight_pos) - timetable.departure_on(boarding, board_pos))
            .as_seconds()
    });
    Stats::from_values(scheduled.chain(frequency))
}

const fn seconds(value: u32) -> Duration {
    Duration::from_seconds(value)
}
