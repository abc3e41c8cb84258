//! Per-identity vote ledger.
//!
//! Records are created lazily on a first successful vote and never revert.

use std::collections::BTreeSet;

use tally_types::Identity;

#[derive(Clone, Debug, Default)]
pub struct VoterLedger {
    voted: BTreeSet<Identity>,
}

impl VoterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_voters(voters: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            voted: voters.into_iter().collect(),
        }
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.voted.contains(identity)
    }

    /// Number of identities with a record.
    pub fn voter_count(&self) -> usize {
        self.voted.len()
    }

    /// Voters in identity order.
    pub fn voters(&self) -> impl Iterator<Item = &Identity> {
        self.voted.iter()
    }

    /// Mark `identity` as voted. Returns false if it already was.
    ///
    /// Only [`crate::Election::vote`] calls this, after it has checked every
    /// precondition, so the ledger and the registry move together.
    pub(crate) fn record(&mut self, identity: Identity) -> bool {
        self.voted.insert(identity)
    }
}
