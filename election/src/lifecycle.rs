//! Open → Closed lifecycle. `Closed` is terminal; nothing reopens it.

use crate::access::AccessControl;
use crate::error::ElectionError;
use tally_types::{ElectionState, Identity};

#[derive(Clone, Debug, Default)]
pub struct ElectionStateMachine {
    state: ElectionState,
}

impl ElectionStateMachine {
    /// A new machine in the `Open` state.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_state(state: ElectionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ElectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Reject with [`ElectionError::ElectionClosed`] once voting has ended.
    pub fn ensure_open(&self) -> Result<(), ElectionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ElectionError::ElectionClosed)
        }
    }

    /// Transition to `Closed`.
    ///
    /// The state check runs before the owner check, so a non-owner calling
    /// on a closed election sees `AlreadyClosed`.
    pub fn close(
        &mut self,
        caller: &Identity,
        access: &AccessControl,
    ) -> Result<(), ElectionError> {
        self.check_close(caller, access)?;
        self.state = ElectionState::Closed;
        Ok(())
    }

    /// The checks of [`close`](Self::close), without the transition.
    pub fn check_close(&self, caller: &Identity, access: &AccessControl) -> Result<(), ElectionError> {
        if self.state.is_terminal() {
            return Err(ElectionError::AlreadyClosed);
        }
        access.ensure_owner(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access() -> AccessControl {
        AccessControl::new(Identity::from("owner"))
    }

    #[test]
    fn starts_open() {
        let sm = ElectionStateMachine::new();
        assert!(sm.is_open());
        assert!(sm.ensure_open().is_ok());
    }

    #[test]
    fn check_close_leaves_state_alone() {
        let sm = ElectionStateMachine::new();
        assert_eq!(
            sm.check_close(&Identity::from("mallory"), &access()),
            Err(ElectionError::Unauthorized {
                caller: Identity::from("mallory")
            })
        );
        assert!(sm.check_close(&Identity::from("owner"), &access()).is_ok());
        assert!(sm.is_open());
    }

    #[test]
    fn owner_closes_once() {
        let mut sm = ElectionStateMachine::new();
        sm.close(&Identity::from("owner"), &access()).unwrap();
        assert_eq!(sm.state(), ElectionState::Closed);
        assert_eq!(sm.ensure_open(), Err(ElectionError::ElectionClosed));
        assert_eq!(
            sm.close(&Identity::from("owner"), &access()),
            Err(ElectionError::AlreadyClosed)
        );
    }

    #[test]
    fn non_owner_cannot_close() {
        let mut sm = ElectionStateMachine::new();
        let err = sm.close(&Identity::from("eve"), &access()).unwrap_err();
        assert!(matches!(err, ElectionError::Unauthorized { .. }));
        assert!(sm.is_open());
    }

    #[test]
    fn closed_check_precedes_owner_check() {
        let mut sm = ElectionStateMachine::with_state(ElectionState::Closed);
        assert_eq!(
            sm.close(&Identity::from("eve"), &access()),
            Err(ElectionError::AlreadyClosed)
        );
    }
}
