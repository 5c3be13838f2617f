mod option;
mod ride;
mod router;
mod state;

pub use option::*;
pub use ride::*;
pub use router::*;
pub use state::*;

use thiserror::Error;

use crate::shared::time::Duration;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No transit stop is reachable from the origin")]
    EmptyAccess,
}

/// Tuning knobs of the profile search.
#[derive(Debug, Clone, Copy)]
pub struct ProfileConfig {
    /// Maximum number of boardings along a path.
    pub max_rounds: usize,
    /// Same meaning as in the scalar search: a vehicle departing inside
    /// this slack after arrival is already gone.
    pub board_slack: Duration,
    /// Absolute prune: states whose best case exceeds this are dropped
    /// regardless of dominance.
    pub cutoff: Duration,
    /// Board each pattern only from its earliest-lower-bound stop in the
    /// first round. Controls branching on dense networks.
    pub first_round_single_boarding: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            board_slack: Duration::from_seconds(60),
            cutoff: Duration::from_minutes(90),
            first_round_single_boarding: true,
        }
    }
}
