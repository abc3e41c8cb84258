//! Pre-built [`tracing::Span`] constructors for election commands.
//!
//! Consistent span names and field sets make it easy to filter and
//! correlate a command with the log lines the core emits while applying it.

use tracing::{info_span, Span};

/// Span covering one vote command, from dequeue to reply.
pub fn vote_span(caller: &str, index: usize) -> Span {
    info_span!("vote", caller = %caller, candidate = index)
}

/// Span covering one end-voting command.
pub fn end_voting_span(caller: &str) -> Span {
    info_span!("end_voting", caller = %caller)
}

/// Span covering one line handled by a host front end.
pub fn request_span(action: &str) -> Span {
    info_span!("request", action = %action)
}
