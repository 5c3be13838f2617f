pub mod propagation;
pub mod worker;

pub use propagation::*;
pub use worker::*;

use thiserror::Error;

use crate::shared::{
    geo::{DEFAULT_WALK_SPEED, Speed},
    time::Duration,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Search deadline exceeded")]
    Timeout,
    #[error("Departure window is empty")]
    EmptyWindow,
    #[error("Store covers {got} targets but the worker data has {expected}")]
    TargetMismatch { expected: usize, got: usize },
}

/// Tuning knobs of the round-based search.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Hard cap on rounds, which bounds the number of boardings considered.
    /// More rounds allow more transfers at more compute.
    pub max_rounds: usize,
    /// A vehicle departing inside this slack after our arrival at a stop is
    /// treated as already gone.
    pub board_slack: Duration,
    /// Horizon from the departure time past which arrivals are discarded.
    pub max_duration: Duration,
    pub walk_speed: Speed,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            board_slack: Duration::from_seconds(60),
            max_duration: Duration::from_hours(2),
            walk_speed: DEFAULT_WALK_SPEED,
        }
    }
}

/// Whether successive departure minutes reuse the label array.
///
/// `Reuse` is the range-RAPTOR optimization: scanning minutes backward,
/// labels only ever improve, so each run starts from the previous minute's
/// labels. `Reset` clears the labels before every minute and exists as the
/// slow reference the optimization is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    Reuse,
    Reset,
}
