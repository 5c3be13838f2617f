//! A profile public transit routing engine.
//!
//! The scalar path runs a round-based RAPTOR search per departure minute
//! over a compacted timetable ([`worker::WorkerData`]), propagates stop
//! arrivals to targets and folds the minutes into per-target statistics
//! ([`stats::PropagatedTimesStore`]). The provenance path
//! ([`profile::ProfileRouter`]) keeps full ride history and enumerates
//! itinerary options with per-leg distributions instead.

pub mod model;
pub mod profile;
pub mod raptor;
pub mod shared;
pub mod stats;
pub mod window;
pub mod worker;

pub mod prelude {
    pub use crate::model::TransitModel;
    pub use crate::profile::{ProfileConfig, ProfileRouter};
    pub use crate::raptor::{RaptorWorker, SearchConfig};
    pub use crate::stats::{PropagatedTimesStore, Stats, SummaryStrategy};
    pub use crate::window::TimeWindow;
    pub use crate::worker::{FrequencyOffsets, StopTreeCache, WorkerData};
}
