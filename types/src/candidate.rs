//! Candidate records and the winner result.

use serde::{Deserialize, Serialize};

/// Ordinal position of a candidate, assigned at construction.
pub type CandidateIndex = usize;

/// A candidate as observed by readers. Its index is its position in the
/// sequence it was returned in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub vote_count: u64,
}

impl Candidate {
    /// A candidate with no votes yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vote_count: 0,
        }
    }
}

/// The leading candidate at the time of the read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Position of the leader in the candidate sequence.
    pub index: CandidateIndex,
    pub name: String,
    pub votes: u64,
}
