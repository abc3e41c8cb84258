//! Serialized election state for hosts that persist between runs.

use std::collections::BTreeSet;

use bincode::Options;
use serde::{Deserialize, Serialize};
use tally_types::{Candidate, CandidateIndex, ElectionState, Identity};

use crate::access::AccessControl;
use crate::election::Election;
use crate::error::ElectionError;
use crate::event::EventBus;
use crate::ledger::VoterLedger;
use crate::lifecycle::ElectionStateMachine;
use crate::registry::CandidateRegistry;

/// Upper bound on an encoded snapshot. Decoding refuses to allocate past it.
const MAX_SNAPSHOT_BYTES: u64 = 64 * 1024 * 1024;

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_SNAPSHOT_BYTES)
}

/// Committed election state, detached from any listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSnapshot {
    pub owner: Identity,
    pub candidates: Vec<Candidate>,
    /// Identities that have voted, sorted.
    pub voters: Vec<Identity>,
    pub state: ElectionState,
}

impl ElectionSnapshot {
    /// Serialize with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, ElectionError> {
        codec()
            .serialize(self)
            .map_err(|e| ElectionError::CorruptSnapshot(e.to_string()))
    }

    /// Deserialize with bincode and check consistency.
    pub fn decode(bytes: &[u8]) -> Result<Self, ElectionError> {
        let snapshot: Self = codec()
            .deserialize(bytes)
            .map_err(|e| ElectionError::CorruptSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check that the snapshot could have been produced by a live election.
    pub fn validate(&self) -> Result<(), ElectionError> {
        if !self.owner.is_valid() {
            return Err(ElectionError::CorruptSnapshot(format!(
                "invalid owner {:?}",
                self.owner.as_str()
            )));
        }
        if self.candidates.is_empty() {
            return Err(ElectionError::CorruptSnapshot("no candidates".into()));
        }
        let unique: BTreeSet<&Identity> = self.voters.iter().collect();
        if unique.len() != self.voters.len() {
            return Err(ElectionError::CorruptSnapshot("duplicate voter record".into()));
        }
        let total = self
            .candidates
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.vote_count))
            .ok_or_else(|| ElectionError::CorruptSnapshot("vote total overflows".into()))?;
        if total != self.voters.len() as u64 {
            return Err(ElectionError::CorruptSnapshot(format!(
                "{} votes counted but {} voters recorded",
                total,
                self.voters.len()
            )));
        }
        Ok(())
    }
}

impl Election {
    /// Capture the committed state.
    pub fn snapshot(&self) -> ElectionSnapshot {
        ElectionSnapshot {
            owner: self.owner().clone(),
            candidates: self.candidates(),
            voters: self.ledger().voters().cloned().collect(),
            state: self.state(),
        }
    }

    /// The snapshot this election would have after `caller` votes for
    /// `index`. Runs the checks of [`Election::vote`] and changes nothing,
    /// so a host can make the result durable before committing it.
    pub fn preview_vote(
        &self,
        caller: &Identity,
        index: CandidateIndex,
    ) -> Result<ElectionSnapshot, ElectionError> {
        self.check_vote(caller, index)?;
        let mut next = self.snapshot();
        let candidate = &mut next.candidates[index];
        candidate.vote_count = candidate
            .vote_count
            .checked_add(1)
            .ok_or(ElectionError::TallyOverflow)?;
        if let Err(pos) = next.voters.binary_search(caller) {
            next.voters.insert(pos, caller.clone());
        }
        Ok(next)
    }

    /// The snapshot this election would have after `caller` ends voting.
    /// Runs the checks of [`Election::end_voting`] and changes nothing.
    pub fn preview_end_voting(&self, caller: &Identity) -> Result<ElectionSnapshot, ElectionError> {
        self.check_end_voting(caller)?;
        let mut next = self.snapshot();
        next.state = ElectionState::Closed;
        Ok(next)
    }

    /// Rebuild an election from a snapshot. Listeners are not restored.
    pub fn restore(snapshot: ElectionSnapshot) -> Result<Self, ElectionError> {
        snapshot.validate()?;
        Ok(Self::from_parts(
            AccessControl::new(snapshot.owner),
            CandidateRegistry::from_candidates(snapshot.candidates)?,
            VoterLedger::from_voters(snapshot.voters),
            ElectionStateMachine::with_state(snapshot.state),
            EventBus::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn election() -> Election {
        let mut e = Election::new(Identity::from("owner"), ["Alice", "Bob", "Carol"]).unwrap();
        e.vote(&Identity::from("v1"), 1).unwrap();
        e.vote(&Identity::from("v2"), 1).unwrap();
        e.vote(&Identity::from("v3"), 2).unwrap();
        e
    }

    #[test]
    fn restore_reproduces_state() {
        let original = election();
        let bytes = original.snapshot().encode().unwrap();
        let restored = Election::restore(ElectionSnapshot::decode(&bytes).unwrap()).unwrap();

        assert_eq!(restored.candidates(), original.candidates());
        assert_eq!(restored.owner(), original.owner());
        assert!(restored.has_voted(&Identity::from("v2")));
        assert!(!restored.has_voted(&Identity::from("v4")));
        assert_eq!(restored.winner(), original.winner());
    }

    #[test]
    fn restored_election_keeps_rejecting_duplicates() {
        let mut restored = Election::restore(election().snapshot()).unwrap();
        assert_eq!(
            restored.vote(&Identity::from("v1"), 0),
            Err(ElectionError::DuplicateVote(Identity::from("v1")))
        );
    }

    #[test]
    fn closed_state_survives_restore() {
        let mut e = election();
        e.end_voting(&Identity::from("owner")).unwrap();
        let restored = Election::restore(e.snapshot()).unwrap();
        assert!(!restored.voting_open());
    }

    #[test]
    fn preview_matches_the_committed_result() {
        let mut e = election();
        let preview = e.preview_vote(&Identity::from("v0"), 0).unwrap();
        assert_eq!(e.total_votes(), 3);
        assert!(!e.has_voted(&Identity::from("v0")));

        e.vote(&Identity::from("v0"), 0).unwrap();
        assert_eq!(preview, e.snapshot());

        let preview = e.preview_end_voting(&Identity::from("owner")).unwrap();
        assert!(e.voting_open());
        e.end_voting(&Identity::from("owner")).unwrap();
        assert_eq!(preview, e.snapshot());
    }

    #[test]
    fn preview_rejects_like_the_real_call() {
        let e = election();
        assert_eq!(
            e.preview_vote(&Identity::from("v1"), 0),
            Err(ElectionError::DuplicateVote(Identity::from("v1")))
        );
        assert_eq!(
            e.preview_vote(&Identity::from("v9"), 3),
            Err(ElectionError::InvalidCandidate { index: 3, count: 3 })
        );
        assert!(matches!(
            e.preview_end_voting(&Identity::from("v1")),
            Err(ElectionError::Unauthorized { .. })
        ));
    }

    #[test]
    fn mismatched_totals_rejected() {
        let mut snap = election().snapshot();
        snap.voters.pop();
        assert!(matches!(
            Election::restore(snap),
            Err(ElectionError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn duplicate_voters_rejected() {
        let mut snap = election().snapshot();
        snap.voters[1] = snap.voters[0].clone();
        assert!(matches!(snap.validate(), Err(ElectionError::CorruptSnapshot(_))));
    }

    #[test]
    fn garbage_bytes_rejected() {
        assert!(matches!(
            ElectionSnapshot::decode(&[0xff, 0x01]),
            Err(ElectionError::CorruptSnapshot(_))
        ));
    }
}
