//! Events emitted after a mutation commits.

use std::fmt;

use tally_types::{CandidateIndex, Identity, Winner};

/// Election-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElectionEvent {
    /// A vote was recorded.
    VoteCast {
        voter: Identity,
        candidate: CandidateIndex,
        new_count: u64,
    },
    /// The owner closed voting. `winner` is the final result.
    VotingEnded { by: Identity, winner: Winner },
}

/// Synchronous fan-out event bus for election events.
///
/// Listeners are invoked inline by the mutating call, after its state
/// change is complete. Keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&ElectionEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &ElectionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
