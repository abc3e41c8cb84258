//! Owner-gated authorization.

use crate::error::ElectionError;
use tally_types::Identity;

/// Holds the single administrator identity fixed at construction.
#[derive(Clone, Debug)]
pub struct AccessControl {
    owner: Identity,
}

impl AccessControl {
    pub fn new(owner: Identity) -> Self {
        Self { owner }
    }

    /// The administrator identity.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_owner(&self, identity: &Identity) -> bool {
        &self.owner == identity
    }

    /// Reject anyone but the owner with [`ElectionError::Unauthorized`].
    pub fn ensure_owner(&self, caller: &Identity) -> Result<(), ElectionError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(ElectionError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }
}
