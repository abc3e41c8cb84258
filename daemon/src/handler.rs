//! Dispatch parsed requests to the election service and shape JSON replies.

use serde_json::{json, Value};
use tracing::Instrument;

use tally_node::tracing_spans::request_span;
use tally_node::{ElectionService, NodeError};

use crate::request::Request;

/// Handle one input line. Never fails: errors become `{"ok": false, ...}`.
pub async fn handle_line(service: &ElectionService, line: &str) -> Value {
    let request = match Request::parse(line) {
        Ok(request) => request,
        Err(e) => return error_reply("bad_request", &e.to_string()),
    };
    let span = request_span(request.action());
    match dispatch(service, request).instrument(span).await {
        Ok(value) => value,
        Err(e) => error_reply(error_kind(&e), &e.to_string()),
    }
}

async fn dispatch(service: &ElectionService, request: Request) -> Result<Value, NodeError> {
    let reply = match request {
        Request::Owner => json!({ "ok": true, "owner": service.owner().await }),
        Request::Candidates => {
            let candidates: Vec<Value> = service
                .candidates()
                .await
                .into_iter()
                .enumerate()
                .map(|(index, c)| {
                    json!({ "index": index, "name": c.name, "vote_count": c.vote_count })
                })
                .collect();
            json!({ "ok": true, "candidates": candidates })
        }
        Request::HasVoted(identity) => {
            let has_voted = service.has_voted(&identity).await;
            json!({ "ok": true, "identity": identity, "has_voted": has_voted })
        }
        Request::Vote { caller, index } => {
            let vote_count = service.vote(caller, index).await?;
            json!({ "ok": true, "candidate": index, "vote_count": vote_count })
        }
        Request::VotingOpen => json!({ "ok": true, "voting_open": service.voting_open().await }),
        Request::EndVoting { caller } => {
            let winner = service.end_voting(caller).await?;
            json!({ "ok": true, "winner": winner })
        }
        Request::Winner => {
            let (winner, is_final) = service.standing().await;
            json!({ "ok": true, "winner": winner, "final": is_final })
        }
        Request::Outcome => json!({ "ok": true, "outcome": service.outcome().await }),
        Request::Metrics => json!({ "ok": true, "metrics": service.metrics().encode_text()? }),
    };
    Ok(reply)
}

fn error_kind(err: &NodeError) -> &'static str {
    match err {
        NodeError::Election(e) => e.kind(),
        NodeError::QueueFull => "queue_full",
        NodeError::ServiceStopped => "service_stopped",
        NodeError::Snapshot(_) => "persistence_failed",
        _ => "internal",
    }
}

fn error_reply(kind: &str, message: &str) -> Value {
    json!({ "ok": false, "error": kind, "message": message })
}
