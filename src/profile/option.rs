use serde::Serialize;

use crate::stats::Stats;

/// One way of making the trip, summarized over the whole departure window.
///
/// Options are what the profile search hands to a caller that wants
/// itineraries rather than a travel-time surface: a readable route chain
/// plus the travel-time distribution backing it.
#[derive(Debug, Clone, Serialize)]
pub struct TripOption {
    /// Human-readable route chain, e.g. `"12 -> 43"`, or `"walk"`.
    pub summary: String,
    /// Total travel time distribution over the window.
    pub stats: Stats,
    /// Number of vehicle-to-vehicle transfers.
    pub transfers: u32,
}

impl TripOption {
    /// Sort key: fastest average first, ties broken by worst case.
    pub fn sort_key(&self) -> (u32, u32) {
        (self.stats.avg, self.stats.max)
    }
}
