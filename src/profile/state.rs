use crate::shared::time::Duration;

/// Index of a [`ProfileState`] in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) u32);

/// Index of a [`crate::profile::Ride`] in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RideId(pub(crate) u32);

/// A node of the profile search: a stop reached with a travel-time interval
/// and full provenance.
///
/// States are immutable once pushed; propagation builds a new state from an
/// existing one plus a delta. Predecessors are arena indices, never
/// references, so reconstruction is a simple index walk.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub stop: u32,
    /// Best-case travel time from the origin.
    pub lower: Duration,
    /// Worst-case travel time from the origin.
    pub upper: Duration,
    pub previous: Option<StateId>,
    /// The ride that produced this state; inherited unchanged by transfer
    /// states.
    pub ride: Option<RideId>,
    /// Worker patterns already ridden on this path, kept sorted. A state
    /// never re-boards any of them.
    pub patterns: Vec<u32>,
    /// Set when this state was produced by a walking transfer; such a state
    /// does not transfer again.
    pub via_transfer: bool,
}

impl ProfileState {
    pub fn rode(&self, pattern: u32) -> bool {
        self.patterns.binary_search(&pattern).is_ok()
    }

    /// Union of the bounds and pattern sets of two states at the same stop
    /// with the same previous ride.
    pub fn absorb(&mut self, other: &ProfileState) {
        debug_assert_eq!(self.stop, other.stop);
        self.lower = self.lower.min(other.lower);
        self.upper = self.upper.max(other.upper);
        for pattern in &other.patterns {
            if let Err(at) = self.patterns.binary_search(pattern) {
                self.patterns.insert(at, *pattern);
            }
        }
    }
}

/// Arena of profile states. States are only ever appended; pruning works on
/// id lists, never by removal, so every id stays valid for provenance walks.
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<ProfileState>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: ProfileState) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(state);
        id
    }

    pub fn get(&self, id: StateId) -> &ProfileState {
        &self.states[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: StateId) -> &mut ProfileState {
        &mut self.states[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[test]
fn absorb_test() {
    let mut a = ProfileState {
        stop: 3,
        lower: Duration::from_seconds(100),
        upper: Duration::from_seconds(200),
        previous: None,
        ride: None,
        patterns: vec![1, 4],
        via_transfer: false,
    };
    let b = ProfileState {
        stop: 3,
        lower: Duration::from_seconds(80),
        upper: Duration::from_seconds(300),
        previous: None,
        ride: None,
        patterns: vec![2, 4],
        via_transfer: false,
    };
    a.absorb(&b);
    assert_eq!(a.lower, Duration::from_seconds(80));
    assert_eq!(a.upper, Duration::from_seconds(300));
    assert_eq!(a.patterns, vec![1, 2, 4]);
}

#[test]
fn rode_test() {
    let state = ProfileState {
        stop: 0,
        lower: Duration::default(),
        upper: Duration::default(),
        previous: None,
        ride: None,
        patterns: vec![2, 5, 9],
        via_transfer: false,
    };
    assert!(state.rode(5));
    assert!(!state.rode(3));
}
