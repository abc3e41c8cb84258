//! Fundamental types for the tally election ledger.
//!
//! This crate defines the plain data shared across every other crate in the
//! workspace: caller identities, candidates, the election lifecycle state,
//! and the winner record.

pub mod candidate;
pub mod identity;
pub mod state;

pub use candidate::{Candidate, CandidateIndex, Winner};
pub use identity::Identity;
pub use state::ElectionState;
