use std::{collections::HashMap, sync::Arc};

mod entities;
pub use entities::*;

use thiserror::Error;
use tracing::debug;

use crate::shared::time::Time;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Stop id does not match any entry")]
    UnknownStopID,
    #[error("Service id does not match any entry")]
    UnknownServiceID,
    #[error("Pattern index does not match any entry")]
    UnknownPattern,
    #[error("Trip has {got} stop times but its pattern has {expected} stops")]
    TimesMismatch { expected: usize, got: usize },
    #[error("Stop times must not decrease along a trip")]
    UnorderedTimes,
    #[error("Frequency headway must be positive")]
    ZeroHeadway,
    #[error("A pattern needs at least one stop")]
    EmptyPattern,
}

type IdToIndex = HashMap<Arc<str>, usize>;

/// The static transit model: stops, patterns, trips and transfers, owned in
/// dense arrays and referenced by index everywhere in the search.
///
/// The model is read-only once built and safe to share across threads.
/// It is the long-lived side of the system; the per-query flattened view
/// lives in [`crate::worker::WorkerData`].
#[derive(Debug, Clone, Default)]
pub struct TransitModel {
    pub stops: Box<[Stop]>,
    pub patterns: Box<[Pattern]>,
    pub trips: Box<[Trip]>,
    /// Global arrival/departure pairs. Each trip and frequency template owns
    /// a contiguous run of `pattern.stops.len()` entries.
    pub trip_times: Box<[TripTime]>,
    pub frequencies: Box<[FrequencyEntry]>,
    /// `None` when the street-network simple-transfer computation never ran.
    /// The search refuses to start on such a model.
    pub transfers: Option<Box<[Transfer]>>,
    /// Calendar service ids, indexed by service code.
    pub services: Box<[Arc<str>]>,

    /// Patterns touching each stop, indexed by stop.
    stop_patterns: Box<[Box<[u32]>]>,
    /// Transfers leaving each stop, indexed by stop.
    stop_transfers: Box<[Box<[u32]>]>,

    stop_lookup: IdToIndex,
    service_lookup: IdToIndex,
}

impl TransitModel {
    pub fn builder() -> TransitModelBuilder {
        TransitModelBuilder::default()
    }

    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        let stop_index = self.stop_lookup.get(id)?;
        Some(&self.stops[*stop_index])
    }

    pub fn service_code(&self, id: &str) -> Option<u16> {
        self.service_lookup.get(id).map(|idx| *idx as u16)
    }

    /// Indices of all patterns calling at the given stop.
    pub fn patterns_for_stop(&self, stop_idx: u32) -> &[u32] {
        &self.stop_patterns[stop_idx as usize]
    }

    /// Indices into `transfers` of all transfers leaving the given stop.
    /// Empty when transfers were never built, the caller must check
    /// [`TransitModel::transfers`] first.
    pub fn transfers_for_stop(&self, stop_idx: u32) -> &[u32] {
        &self.stop_transfers[stop_idx as usize]
    }

    /// The arrival/departure pairs of a scheduled trip, one per pattern stop.
    pub fn times_for_trip(&self, trip: &Trip) -> &[TripTime] {
        let pattern = &self.patterns[trip.pattern_idx as usize];
        let start = trip.times_start as usize;
        &self.trip_times[start..start + pattern.stops.len()]
    }

    /// The relative trip profile of a frequency entry, one per pattern stop.
    pub fn times_for_frequency(&self, entry: &FrequencyEntry) -> &[TripTime] {
        let pattern = &self.patterns[entry.pattern_idx as usize];
        let start = entry.times_start as usize;
        &self.trip_times[start..start + pattern.stops.len()]
    }
}

/// Staged construction of a [`TransitModel`].
///
/// The ingestion pipeline (out of scope here) drives this builder; tests
/// drive it directly to assemble synthetic networks.
#[derive(Debug, Default)]
pub struct TransitModelBuilder {
    stops: Vec<Stop>,
    patterns: Vec<Pattern>,
    trips: Vec<Trip>,
    trip_times: Vec<TripTime>,
    frequencies: Vec<FrequencyEntry>,
    transfers: Option<Vec<Transfer>>,
    services: Vec<Arc<str>>,

    stop_lookup: IdToIndex,
    service_lookup: IdToIndex,
}

impl TransitModelBuilder {
    pub fn add_stop(
        &mut self,
        id: &str,
        name: &str,
        coordinate: crate::shared::geo::Coordinate,
    ) -> u32 {
        let index = self.stops.len() as u32;
        let stop = Stop {
            index,
            id: id.into(),
            name: name.into(),
            coordinate,
        };
        self.stop_lookup.insert(stop.id.clone(), index as usize);
        self.stops.push(stop);
        index
    }

    pub fn add_service(&mut self, id: &str) -> u16 {
        let code = self.services.len() as u16;
        let id: Arc<str> = id.into();
        self.service_lookup.insert(id.clone(), code as usize);
        self.services.push(id);
        code
    }

    /// Registers a pattern over already-added stops, in calling order.
    pub fn add_pattern(&mut self, route_id: &str, stop_ids: &[&str]) -> Result<u32, Error> {
        if stop_ids.is_empty() {
            return Err(Error::EmptyPattern);
        }
        let mut stops = Vec::with_capacity(stop_ids.len());
        for id in stop_ids {
            let idx = self.stop_lookup.get(*id).ok_or(Error::UnknownStopID)?;
            stops.push(*idx as u32);
        }
        let index = self.patterns.len() as u32;
        self.patterns.push(Pattern {
            index,
            route_id: route_id.into(),
            stops: stops.into(),
            trips: Vec::new().into(),
            frequencies: Vec::new().into(),
        });
        Ok(index)
    }

    /// Adds a scheduled trip to a pattern. `times` must hold one
    /// arrival/departure pair per pattern stop, in stop order.
    pub fn add_trip(
        &mut self,
        id: &str,
        pattern_idx: u32,
        service: u16,
        times: &[(Time, Time)],
    ) -> Result<u32, Error> {
        let pattern = self
            .patterns
            .get(pattern_idx as usize)
            .ok_or(Error::UnknownPattern)?;
        if times.len() != pattern.stops.len() {
            return Err(Error::TimesMismatch {
                expected: pattern.stops.len(),
                got: times.len(),
            });
        }
        validate_ordered(times)?;
        if service as usize >= self.services.len() {
            return Err(Error::UnknownServiceID);
        }

        let index = self.trips.len() as u32;
        let times_start = self.trip_times.len() as u32;
        self.trip_times.extend(times.iter().map(|(arr, dep)| TripTime {
            arrival: *arr,
            departure: *dep,
        }));
        self.trips.push(Trip {
            index,
            id: id.into(),
            pattern_idx,
            service,
            times_start,
        });
        Ok(index)
    }

    /// Adds a frequency entry to a pattern. `profile` holds offsets from the
    /// vehicle's first-stop departure, one pair per pattern stop.
    pub fn add_frequency(
        &mut self,
        pattern_idx: u32,
        service: u16,
        profile: &[(Time, Time)],
        start: Time,
        end: Time,
        headway: crate::shared::time::Duration,
    ) -> Result<u32, Error> {
        let pattern = self
            .patterns
            .get(pattern_idx as usize)
            .ok_or(Error::UnknownPattern)?;
        if profile.len() != pattern.stops.len() {
            return Err(Error::TimesMismatch {
                expected: pattern.stops.len(),
                got: profile.len(),
            });
        }
        validate_ordered(profile)?;
        if service as usize >= self.services.len() {
            return Err(Error::UnknownServiceID);
        }
        if headway.as_seconds() == 0 {
            return Err(Error::ZeroHeadway);
        }

        let index = self.frequencies.len() as u32;
        let times_start = self.trip_times.len() as u32;
        self.trip_times
            .extend(profile.iter().map(|(arr, dep)| TripTime {
                arrival: *arr,
                departure: *dep,
            }));
        self.frequencies.push(FrequencyEntry {
            index,
            pattern_idx,
            service,
            times_start,
            start,
            end,
            headway,
        });
        Ok(index)
    }

    /// Installs the precomputed simple-transfer edges. Calling this with an
    /// empty list still marks transfers as built; never calling it leaves
    /// the model unusable for searching.
    pub fn set_transfers(&mut self, transfers: Vec<Transfer>) {
        self.transfers = Some(transfers);
    }

    pub fn add_transfer(&mut self, from: &str, to: &str, distance: crate::shared::geo::Distance) -> Result<(), Error> {
        let from_stop_idx = *self.stop_lookup.get(from).ok_or(Error::UnknownStopID)? as u32;
        let to_stop_idx = *self.stop_lookup.get(to).ok_or(Error::UnknownStopID)? as u32;
        self.transfers.get_or_insert_default().push(Transfer {
            from_stop_idx,
            to_stop_idx,
            distance,
        });
        Ok(())
    }

    pub fn build(mut self) -> TransitModel {
        // Wire trip and frequency lists back onto their patterns
        let mut pattern_trips: Vec<Vec<u32>> = vec![Vec::new(); self.patterns.len()];
        for trip in &self.trips {
            pattern_trips[trip.pattern_idx as usize].push(trip.index);
        }
        let mut pattern_freqs: Vec<Vec<u32>> = vec![Vec::new(); self.patterns.len()];
        for entry in &self.frequencies {
            pattern_freqs[entry.pattern_idx as usize].push(entry.index);
        }
        for (pattern, (trips, freqs)) in self
            .patterns
            .iter_mut()
            .zip(pattern_trips.into_iter().zip(pattern_freqs))
        {
            pattern.trips = trips.into();
            pattern.frequencies = freqs.into();
        }

        let mut stop_patterns: Vec<Vec<u32>> = vec![Vec::new(); self.stops.len()];
        for pattern in &self.patterns {
            for stop_idx in pattern.stops.iter() {
                let list = &mut stop_patterns[*stop_idx as usize];
                if !list.contains(&pattern.index) {
                    list.push(pattern.index);
                }
            }
        }

        let mut stop_transfers: Vec<Vec<u32>> = vec![Vec::new(); self.stops.len()];
        if let Some(transfers) = &self.transfers {
            for (i, transfer) in transfers.iter().enumerate() {
                stop_transfers[transfer.from_stop_idx as usize].push(i as u32);
            }
        }

        debug!(
            stops = self.stops.len(),
            patterns = self.patterns.len(),
            trips = self.trips.len(),
            frequencies = self.frequencies.len(),
            "built transit model"
        );

        TransitModel {
            stops: self.stops.into(),
            patterns: self.patterns.into(),
            trips: self.trips.into(),
            trip_times: self.trip_times.into(),
            frequencies: self.frequencies.into(),
            transfers: self.transfers.map(Into::into),
            services: self.services.into(),
            stop_patterns: stop_patterns
                .into_iter()
                .map(Into::into)
                .collect(),
            stop_transfers: stop_transfers
                .into_iter()
                .map(Into::into)
                .collect(),
            stop_lookup: self.stop_lookup,
            service_lookup: self.service_lookup,
        }
    }
}

fn validate_ordered(times: &[(Time, Time)]) -> Result<(), Error> {
    let mut last = crate::shared::time::MIN;
    for (arrival, departure) in times {
        if *arrival < last || departure < arrival {
            return Err(Error::UnorderedTimes);
        }
        last = *departure;
    }
    Ok(())
}

#[test]
fn builder_wires_patterns_test() {
    let mut builder = TransitModel::builder();
    let coordinate = crate::shared::geo::Coordinate::default();
    builder.add_stop("a", "A", coordinate);
    builder.add_stop("b", "B", coordinate);
    let service = builder.add_service("weekday");
    let pattern = builder.add_pattern("r1", &["a", "b"]).unwrap();
    builder
        .add_trip(
            "t1",
            pattern,
            service,
            &[
                (Time::from_seconds(100), Time::from_seconds(110)),
                (Time::from_seconds(200), Time::from_seconds(210)),
            ],
        )
        .unwrap();
    builder.set_transfers(vec![]);
    let model = builder.build();

    assert_eq!(model.patterns[0].trips.len(), 1);
    assert_eq!(model.patterns_for_stop(0), &[0]);
    assert_eq!(model.patterns_for_stop(1), &[0]);
    assert_eq!(model.times_for_trip(&model.trips[0]).len(), 2);
}

#[test]
fn builder_rejects_mismatched_times_test() {
    let mut builder = TransitModel::builder();
    let coordinate = crate::shared::geo::Coordinate::default();
    builder.add_stop("a", "A", coordinate);
    builder.add_stop("b", "B", coordinate);
    let service = builder.add_service("weekday");
    let pattern = builder.add_pattern("r1", &["a", "b"]).unwrap();
    let result = builder.add_trip(
        "t1",
        pattern,
        service,
        &[(Time::from_seconds(100), Time::from_seconds(110))],
    );
    assert!(matches!(result, Err(Error::TimesMismatch { .. })));
}

#[test]
fn builder_rejects_unordered_times_test() {
    let mut builder = TransitModel::builder();
    let coordinate = crate::shared::geo::Coordinate::default();
    builder.add_stop("a", "A", coordinate);
    builder.add_stop("b", "B", coordinate);
    let service = builder.add_service("weekday");
    let pattern = builder.add_pattern("r1", &["a", "b"]).unwrap();
    let result = builder.add_trip(
        "t1",
        pattern,
        service,
        &[
            (Time::from_seconds(200), Time::from_seconds(210)),
            (Time::from_seconds(100), Time::from_seconds(110)),
        ],
    );
    assert!(matches!(result, Err(Error::UnorderedTimes)));
}
