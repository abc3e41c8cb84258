//! The election aggregate: the single owner of all mutable state.
//!
//! Every write goes through `&mut self`, so a host that serializes access to
//! one `Election` (a mutex, or a single writer task) gets the all-or-nothing
//! semantics of each operation for free: preconditions are checked before
//! anything is touched, and the ledger and registry change together.

use tracing::{debug, info, warn};

use tally_types::{Candidate, CandidateIndex, ElectionState, Identity, Winner};

use crate::access::AccessControl;
use crate::error::ElectionError;
use crate::event::{ElectionEvent, EventBus};
use crate::ledger::VoterLedger;
use crate::lifecycle::ElectionStateMachine;
use crate::registry::CandidateRegistry;
use crate::winner::WinnerCalculator;

#[derive(Debug)]
pub struct Election {
    access: AccessControl,
    registry: CandidateRegistry,
    ledger: VoterLedger,
    lifecycle: ElectionStateMachine,
    events: EventBus,
}

impl Election {
    /// Open a new election administered by `owner`.
    ///
    /// Fails with [`ElectionError::NoCandidates`] for an empty name list and
    /// [`ElectionError::InvalidIdentity`] for a blank owner.
    pub fn new<I, S>(owner: Identity, names: I) -> Result<Self, ElectionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !owner.is_valid() {
            return Err(ElectionError::InvalidIdentity(owner.as_str().to_string()));
        }
        let registry = CandidateRegistry::new(names)?;
        info!(owner = %owner, candidates = registry.len(), "election opened");
        Ok(Self::from_parts(
            AccessControl::new(owner),
            registry,
            VoterLedger::new(),
            ElectionStateMachine::new(),
            EventBus::new(),
        ))
    }

    pub(crate) fn from_parts(
        access: AccessControl,
        registry: CandidateRegistry,
        ledger: VoterLedger,
        lifecycle: ElectionStateMachine,
        events: EventBus,
    ) -> Self {
        Self {
            access,
            registry,
            ledger,
            lifecycle,
            events,
        }
    }

    /// Register a listener for committed mutations.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// The fixed administrator identity.
    pub fn owner(&self) -> &Identity {
        self.access.owner()
    }

    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.access.is_owner(identity)
    }

    /// Every candidate with its current count, in index order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.registry.list()
    }

    pub fn candidate_count(&self) -> usize {
        self.registry.len()
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.ledger.has_voted(identity)
    }

    pub fn voting_open(&self) -> bool {
        self.lifecycle.is_open()
    }

    pub fn state(&self) -> ElectionState {
        self.lifecycle.state()
    }

    /// The current leader; the final result once voting is closed.
    pub fn winner(&self) -> Winner {
        WinnerCalculator::leader(self.registry.as_slice())
            .expect("registry is non-empty by construction")
    }

    /// The winner, but only after voting has closed.
    pub fn outcome(&self) -> Option<Winner> {
        if self.lifecycle.is_open() {
            None
        } else {
            Some(self.winner())
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.registry.total_votes()
    }

    pub fn voter_count(&self) -> usize {
        self.ledger.voter_count()
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &VoterLedger {
        &self.ledger
    }

    // ── Writes ─────────────────────────────────────────────────────────

    /// Cast `caller`'s one vote for the candidate at `index`.
    ///
    /// Checked in order: voting open, candidate exists, caller has not voted.
    /// On success the caller is marked and the count incremented together;
    /// returns the candidate's new count.
    pub fn vote(&mut self, caller: &Identity, index: CandidateIndex) -> Result<u64, ElectionError> {
        if let Err(err) = self.check_vote(caller, index) {
            debug!(voter = %caller, candidate = index, error = %err, "vote rejected");
            return Err(err);
        }

        let new_count = self.registry.increment(index)?;
        self.ledger.record(caller.clone());

        info!(voter = %caller, candidate = index, votes = new_count, "vote recorded");
        self.events.emit(&ElectionEvent::VoteCast {
            voter: caller.clone(),
            candidate: index,
            new_count,
        });
        Ok(new_count)
    }

    pub(crate) fn check_vote(&self, caller: &Identity, index: CandidateIndex) -> Result<(), ElectionError> {
        self.lifecycle.ensure_open()?;
        self.registry.ensure_exists(index)?;
        if self.ledger.has_voted(caller) {
            return Err(ElectionError::DuplicateVote(caller.clone()));
        }
        self.registry.ensure_incrementable(index)
    }

    pub(crate) fn check_end_voting(&self, caller: &Identity) -> Result<(), ElectionError> {
        self.lifecycle.check_close(caller, &self.access)
    }

    /// Close voting for good. Only the owner may do this, and only once.
    /// Returns the final winner.
    pub fn end_voting(&mut self, caller: &Identity) -> Result<Winner, ElectionError> {
        if let Err(err) = self.lifecycle.close(caller, &self.access) {
            warn!(caller = %caller, error = %err, "end voting rejected");
            return Err(err);
        }

        let winner = self.winner();
        info!(
            by = %caller,
            winner = %winner.name,
            votes = winner.votes,
            "voting closed"
        );
        self.events.emit(&ElectionEvent::VotingEnded {
            by: caller.clone(),
            winner: winner.clone(),
        });
        Ok(winner)
    }
}
