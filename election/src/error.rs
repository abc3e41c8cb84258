use tally_types::{CandidateIndex, Identity};
use thiserror::Error;

/// Every variant signals a rejected precondition; state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("caller {caller} is not the election owner")]
    Unauthorized { caller: Identity },

    #[error("voting has been closed")]
    ElectionClosed,

    #[error("voting is already closed")]
    AlreadyClosed,

    #[error("identity {0} has already voted")]
    DuplicateVote(Identity),

    #[error("invalid candidate index {index} (candidate count is {count})")]
    InvalidCandidate {
        index: CandidateIndex,
        count: usize,
    },

    #[error("an election needs at least one candidate")]
    NoCandidates,

    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),

    #[error("vote counter overflow")]
    TallyOverflow,

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl ElectionError {
    /// Stable snake_case name of the variant, for metric labels and
    /// machine-readable replies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::ElectionClosed => "election_closed",
            Self::AlreadyClosed => "already_closed",
            Self::DuplicateVote(_) => "duplicate_vote",
            Self::InvalidCandidate { .. } => "invalid_candidate",
            Self::NoCandidates => "no_candidates",
            Self::InvalidIdentity(_) => "invalid_identity",
            Self::TallyOverflow => "tally_overflow",
            Self::CorruptSnapshot(_) => "corrupt_snapshot",
        }
    }
}
