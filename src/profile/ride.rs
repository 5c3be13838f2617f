use std::collections::HashMap;

use crate::{profile::state::RideId, stats::Stats};

/// One way of riding between two stops: a pattern with board and alight
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRide {
    pub pattern: u32,
    pub board_pos: usize,
    pub alight_pos: usize,
}

/// A group of [`PatternRide`]s sharing the same board stop, alight stop and
/// previous ride.
///
/// Patterns that connect the same pair of stops from the same predecessor
/// are effectively indistinguishable route choices; grouping them into one
/// ride is what keeps near-duplicate alternatives from exploding the search.
#[derive(Debug, Clone)]
pub struct Ride {
    pub from_stop: u32,
    pub to_stop: u32,
    pub previous: Option<RideId>,
    pub pattern_rides: Vec<PatternRide>,
    /// Waiting time distribution at the board stop over the window.
    pub wait: Stats,
    /// In-vehicle time distribution over the window.
    pub ride: Stats,
}

/// Arena of rides, interned on `(from, to, previous)`.
#[derive(Debug, Default)]
pub struct RideArena {
    rides: Vec<Ride>,
    keys: HashMap<(u32, u32, Option<RideId>), RideId>,
}

impl RideArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pattern ride under its `(from, to, previous)` key, either
    /// extending the existing ride (stats pooled, pattern appended) or
    /// creating a fresh one.
    pub fn intern(
        &mut self,
        from_stop: u32,
        to_stop: u32,
        previous: Option<RideId>,
        pattern_ride: PatternRide,
        wait: Stats,
        ride: Stats,
    ) -> RideId {
        let key = (from_stop, to_stop, previous);
        if let Some(id) = self.keys.get(&key) {
            let existing = &mut self.rides[id.0 as usize];
            if !existing.pattern_rides.contains(&pattern_ride) {
                existing.pattern_rides.push(pattern_ride);
            }
            existing.wait = existing.wait.merge(&wait);
            existing.ride = existing.ride.merge(&ride);
            *id
        } else {
            let id = RideId(self.rides.len() as u32);
            self.rides.push(Ride {
                from_stop,
                to_stop,
                previous,
                pattern_rides: vec![pattern_ride],
                wait,
                ride,
            });
            self.keys.insert(key, id);
            id
        }
    }

    pub fn get(&self, id: RideId) -> &Ride {
        &self.rides[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.rides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }
}

#[test]
fn intern_groups_by_key_test() {
    use crate::shared::time::Duration;

    let mut arena = RideArena::new();
    let wait = Stats::scalar(Duration::from_seconds(60));
    let ride = Stats::scalar(Duration::from_seconds(300));
    let a = arena.intern(
        0,
        5,
        None,
        PatternRide {
            pattern: 1,
            board_pos: 0,
            alight_pos: 3,
        },
        wait,
        ride,
    );
    let b = arena.intern(
        0,
        5,
        None,
        PatternRide {
            pattern: 2,
            board_pos: 1,
            alight_pos: 4,
        },
        wait,
        ride,
    );
    // same (from, to, previous) triple, one ride with two pattern rides
    assert_eq!(a, b);
    assert_eq!(arena.len(), 1);
    assert_eq!(arena.get(a).pattern_rides.len(), 2);
    assert_eq!(arena.get(a).wait.count, 2);

    let c = arena.intern(
        0,
        6,
        None,
        PatternRide {
            pattern: 1,
            board_pos: 0,
            alight_pos: 4,
        },
        wait,
        ride,
    );
    assert_ne!(a, c);
    assert_eq!(arena.len(), 2);
}
