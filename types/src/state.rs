//! Election lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The Open/Closed lifecycle flag. `Closed` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionState {
    /// Accepting votes.
    #[default]
    Open,
    /// Voting has ended; results are final.
    Closed,
}

impl ElectionState {
    /// Whether votes are accepted.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether no further transition exists from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
