//! Election ledger core.
//!
//! A fixed set of candidates, at most one vote per identity, and a single
//! owner who may irreversibly close voting. Components, leaves first:
//!
//! - [`AccessControl`]: the owner identity and authorization checks
//! - [`CandidateRegistry`]: ordered candidates and their counters
//! - [`VoterLedger`]: which identities have voted
//! - [`ElectionStateMachine`]: the Open → Closed lifecycle
//! - [`WinnerCalculator`]: lowest-index-wins leader scan
//!
//! [`Election`] owns all of them and is the only place mutations happen.
//! Nothing here blocks or performs I/O; serializing concurrent callers is
//! the host's job (see the `tally-node` service).

pub mod access;
pub mod election;
pub mod error;
pub mod event;
pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod snapshot;
pub mod winner;

pub use access::AccessControl;
pub use election::Election;
pub use error::ElectionError;
pub use event::{ElectionEvent, EventBus};
pub use ledger::VoterLedger;
pub use lifecycle::ElectionStateMachine;
pub use registry::CandidateRegistry;
pub use snapshot::ElectionSnapshot;
pub use winner::WinnerCalculator;
