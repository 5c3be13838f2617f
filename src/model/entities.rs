use std::sync::Arc;

use crate::shared::{
    geo::{Coordinate, Distance},
    time::{Duration, Time},
};

/// A physical point where passengers can board or alight from a vehicle.
#[derive(Debug, Default, Clone)]
pub struct Stop {
    /// The global internal index used for O(1) array lookups in the model.
    pub index: u32,
    /// Unique external identifier for the stop.
    pub id: Arc<str>,
    /// Human-readable name (e.g., "Main St & 4th Ave").
    pub name: Arc<str>,
    pub coordinate: Coordinate,
}

/// One arrival/departure pair at a single stop of a trip.
///
/// For scheduled trips these are absolute times on the service day.
/// For frequency templates they are offsets from the vehicle's departure
/// at the first stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct TripTime {
    pub arrival: Time,
    pub departure: Time,
}

/// A specific scheduled journey of a vehicle along its pattern.
#[derive(Debug, Default, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Arc<str>,
    /// Pointer to the parent [`Pattern`].
    pub pattern_idx: u32,
    /// Calendar service this trip runs under, as a small-integer code.
    pub service: u16,
    /// Start of this trip's times in the model's global `trip_times` array.
    /// The length is the parent pattern's stop count.
    pub times_start: u32,
}

/// A unique ordered sequence of stops shared by a group of trips.
///
/// Every trip of a pattern calls at the *exact same stop sequence*, which is
/// what lets the search scan a pattern once per round instead of once per
/// trip.
#[derive(Debug, Default, Clone)]
pub struct Pattern {
    /// Internal index of this pattern.
    pub index: u32,
    /// The external route this pattern belongs to.
    pub route_id: Arc<str>,
    /// List of stop indices served by this pattern in order.
    pub stops: Arc<[u32]>,
    /// List of trip indices that follow this stop sequence.
    pub trips: Arc<[u32]>,
    /// Frequency entries serving this pattern, if any.
    pub frequencies: Arc<[u32]>,
}

/// Headway-based service on a pattern: a vehicle departs the first stop
/// every `headway` seconds inside `[start, end)`, following the relative
/// trip profile stored in `trip_times`.
#[derive(Debug, Default, Clone)]
pub struct FrequencyEntry {
    pub index: u32,
    pub pattern_idx: u32,
    pub service: u16,
    /// Start of the relative trip profile in the global `trip_times` array.
    pub times_start: u32,
    /// First possible departure from the pattern's first stop.
    pub start: Time,
    /// No departures at or after this time.
    pub end: Time,
    pub headway: Duration,
}

/// A directed walking edge between two stops.
///
/// Derived from a precomputed street-network simple-transfer computation.
/// Symmetric in practice but stored directionally.
#[derive(Debug, Default, Clone)]
pub struct Transfer {
    pub from_stop_idx: u32,
    pub to_stop_idx: u32,
    pub distance: Distance,
}
