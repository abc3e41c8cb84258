//! The stdin line protocol.
//!
//! One request per line, whitespace separated. Identities come in on the
//! line itself; whatever feeds the daemon is expected to have
//! authenticated them.

use tally_types::{CandidateIndex, Identity};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Owner,
    Candidates,
    HasVoted(Identity),
    Vote {
        caller: Identity,
        index: CandidateIndex,
    },
    VotingOpen,
    EndVoting {
        caller: Identity,
    },
    Winner,
    Outcome,
    Metrics,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("{action} needs <{arg}>")]
    MissingArgument {
        action: &'static str,
        arg: &'static str,
    },

    #[error("candidate index {0:?} is not a non-negative integer")]
    BadIndex(String),

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let action = words.next().ok_or(ParseError::Empty)?;

        let request = match action {
            "owner" => Self::Owner,
            "candidates" => Self::Candidates,
            "voting-open" => Self::VotingOpen,
            "winner" => Self::Winner,
            "outcome" => Self::Outcome,
            "metrics" => Self::Metrics,
            "has-voted" => Self::HasVoted(identity(words.next(), "has-voted")?),
            "vote" => {
                let caller = identity(words.next(), "vote")?;
                let raw = words.next().ok_or(ParseError::MissingArgument {
                    action: "vote",
                    arg: "index",
                })?;
                let index = raw
                    .parse::<CandidateIndex>()
                    .map_err(|_| ParseError::BadIndex(raw.to_string()))?;
                Self::Vote { caller, index }
            }
            "end-voting" => Self::EndVoting {
                caller: identity(words.next(), "end-voting")?,
            },
            other => return Err(ParseError::UnknownAction(other.to_string())),
        };

        let rest: Vec<&str> = words.collect();
        if !rest.is_empty() {
            return Err(ParseError::TrailingInput(rest.join(" ")));
        }
        Ok(request)
    }

    /// Action name, as written on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Candidates => "candidates",
            Self::HasVoted(_) => "has-voted",
            Self::Vote { .. } => "vote",
            Self::VotingOpen => "voting-open",
            Self::EndVoting { .. } => "end-voting",
            Self::Winner => "winner",
            Self::Outcome => "outcome",
            Self::Metrics => "metrics",
        }
    }
}

fn identity(word: Option<&str>, action: &'static str) -> Result<Identity, ParseError> {
    word.map(Identity::from).ok_or(ParseError::MissingArgument {
        action,
        arg: "identity",
    })
}
