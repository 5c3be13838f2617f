use crate::{
    model::TransitModel,
    shared::time::{Duration, Time},
    window::TimeWindow,
};

/// A compacted, read-only view of every trip of one pattern that can run
/// inside a query window.
///
/// Scheduled trips are flattened into a `[trip][stop * 2 {arrival,
/// departure}]` matrix sorted ascending by first-stop arrival. Real-world
/// schedules may be overtaking, so the sort is only exploited for the
/// boarding scan at a single stop, never across stops.
#[derive(Debug, Clone)]
pub struct PatternTimetable {
    stop_count: usize,
    /// Flattened `[trip][stop * 2]` times, sorted by first-stop arrival.
    times: Box<[Time]>,
    /// Model trip index behind each compacted row.
    trip_indices: Box<[u32]>,
    /// Frequency service active in the window, if any.
    frequencies: Box<[FrequencyRow]>,
}

/// One headway-based entry: departures from the pattern's first stop every
/// `headway` seconds inside `[start, end)`, following `profile`.
#[derive(Debug, Clone)]
pub struct FrequencyRow {
    /// Model frequency entry behind this row.
    pub entry_idx: u32,
    /// Relative `[stop * 2]` profile, offsets from first-stop departure.
    profile: Box<[Duration]>,
    pub start: Time,
    pub end: Time,
    pub headway: Duration,
}

/// A boarded vehicle during a pattern scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boarding {
    /// Row into the scheduled matrix.
    Scheduled { row: usize },
    /// A frequency vehicle pinned to a concrete first-stop departure.
    Frequency { row: usize, vehicle_start: Time },
}

impl PatternTimetable {
    /// Compacts the trips of `pattern` that qualify for `window`: service
    /// active, first-stop arrival before window end, last-stop departure at
    /// or after window start. Returns `None` when nothing qualifies, in
    /// which case the whole pattern is dropped from the worker data.
    pub fn compact(
        model: &TransitModel,
        pattern_idx: u32,
        window: &TimeWindow,
    ) -> Option<PatternTimetable> {
        let pattern = &model.patterns[pattern_idx as usize];
        let stop_count = pattern.stops.len();

        let mut rows: Vec<(Time, u32)> = Vec::new();
        for trip_idx in pattern.trips.iter() {
            let trip = &model.trips[*trip_idx as usize];
            if !window.includes_service(trip.service) {
                continue;
            }
            let times = model.times_for_trip(trip);
            let first_arrival = times[0].arrival;
            let last_departure = times[stop_count - 1].departure;
            if window.overlaps(first_arrival, last_departure) {
                rows.push((first_arrival, *trip_idx));
            }
        }
        rows.sort_by_key(|(first_arrival, _)| *first_arrival);

        let mut frequencies: Vec<FrequencyRow> = Vec::new();
        for entry_idx in pattern.frequencies.iter() {
            let entry = &model.frequencies[*entry_idx as usize];
            if !window.includes_service(entry.service) {
                continue;
            }
            if entry.start >= window.to_time() || entry.end < window.from_time() {
                continue;
            }
            let profile = model
                .times_for_frequency(entry)
                .iter()
                .flat_map(|tt| {
                    [
                        Duration::from_seconds(tt.arrival.as_seconds()),
                        Duration::from_seconds(tt.departure.as_seconds()),
                    ]
                })
                .collect();
            frequencies.push(FrequencyRow {
                entry_idx: *entry_idx,
                profile,
                start: entry.start,
                end: entry.end,
                headway: entry.headway,
            });
        }

        if rows.is_empty() && frequencies.is_empty() {
            return None;
        }

        let mut times = Vec::with_capacity(rows.len() * stop_count * 2);
        let mut trip_indices = Vec::with_capacity(rows.len());
        for (_, trip_idx) in rows {
            let trip = &model.trips[trip_idx as usize];
            for tt in model.times_for_trip(trip) {
                times.push(tt.arrival);
                times.push(tt.departure);
            }
            trip_indices.push(trip_idx);
        }

        Some(PatternTimetable {
            stop_count,
            times: times.into(),
            trip_indices: trip_indices.into(),
            frequencies: frequencies.into(),
        })
    }

    pub fn trip_count(&self) -> usize {
        self.trip_indices.len()
    }

    pub fn frequency_rows(&self) -> &[FrequencyRow] {
        &self.frequencies
    }

    pub fn trip_index(&self, row: usize) -> u32 {
        self.trip_indices[row]
    }

    pub fn arrival(&self, row: usize, stop_pos: usize) -> Time {
        self.times[(row * self.stop_count + stop_pos) * 2]
    }

    pub fn departure(&self, row: usize, stop_pos: usize) -> Time {
        self.times[(row * self.stop_count + stop_pos) * 2 + 1]
    }

    /// The earliest scheduled row departing `stop_pos` at or after
    /// `earliest`. A full scan with min-tracking: rows are sorted by first
    /// stop arrival, which an overtaking trip can violate downstream.
    pub fn next_scheduled_departure(
        &self,
        stop_pos: usize,
        earliest: Time,
    ) -> Option<(usize, Time)> {
        let mut best: Option<(usize, Time)> = None;
        for row in 0..self.trip_count() {
            let departure = self.departure(row, stop_pos);
            if departure < earliest {
                continue;
            }
            match best {
                Some((_, time_to_beat)) if departure >= time_to_beat => {}
                _ => best = Some((row, departure)),
            }
        }
        best
    }

    /// The earliest frequency departure from `stop_pos` at or after
    /// `earliest`, given the per-row phase offsets of the current simulated
    /// minute. A vehicle whose window has passed is simply not available.
    pub fn next_frequency_departure(
        &self,
        stop_pos: usize,
        earliest: Time,
        offsets: &[Duration],
    ) -> Option<(usize, Time, Time)> {
        let mut best: Option<(usize, Time, Time)> = None;
        for (row_idx, row) in self.frequencies.iter().enumerate() {
            let offset = offsets.get(row_idx).copied().unwrap_or_default();
            let profile_departure = row.profile[stop_pos * 2 + 1];
            let first_start = row.start + offset;

            // first vehicle start whose departure at stop_pos makes `earliest`
            let vehicle_start = if earliest <= first_start + profile_departure {
                first_start
            } else {
                let gap = (earliest - (first_start + profile_departure)).as_seconds();
                let headway = row.headway.as_seconds();
                let steps = gap.div_ceil(headway);
                first_start + Duration::from_seconds(steps * headway)
            };
            if vehicle_start >= row.end {
                continue;
            }
            let departure = vehicle_start + profile_departure;
            match best {
                Some((_, _, time_to_beat)) if departure >= time_to_beat => {}
                _ => best = Some((row_idx, vehicle_start, departure)),
            }
        }
        best
    }

    /// Arrival at `stop_pos` for a boarded vehicle.
    pub fn arrival_on(&self, boarding: Boarding, stop_pos: usize) -> Time {
        match boarding {
            Boarding::Scheduled { row } => self.arrival(row, stop_pos),
            Boarding::Frequency { row, vehicle_start } => {
                vehicle_start + self.frequencies[row].profile[stop_pos * 2]
            }
        }
    }

    /// Departure from `stop_pos` for a boarded vehicle.
    pub fn departure_on(&self, boarding: Boarding, stop_pos: usize) -> Time {
        match boarding {
            Boarding::Scheduled { row } => self.departure(row, stop_pos),
            Boarding::Frequency { row, vehicle_start } => {
                vehicle_start + self.frequencies[row].profile[stop_pos * 2 + 1]
            }
        }
    }
}
