//! Prometheus metrics for the election host.
//!
//! [`ElectionMetrics`] owns a dedicated [`Registry`]; hosts encode it into
//! the Prometheus text exposition format with [`ElectionMetrics::encode_text`].

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use tally_election::{Election, ElectionError};

use crate::NodeError;

pub struct ElectionMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub votes_accepted: IntCounter,
    /// Rejected votes, labelled by error kind.
    pub votes_rejected: IntCounterVec,
    /// End-voting attempts, labelled `ok` or by error kind.
    pub close_attempts: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub candidate_count: IntGauge,
    pub voter_count: IntGauge,
    /// 1 while voting is open, 0 once closed.
    pub voting_open: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time a command spends between enqueue and reply, in milliseconds.
    pub command_latency_ms: Histogram,
}

impl ElectionMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let votes_accepted = register_int_counter_with_registry!(
            Opts::new("tally_votes_accepted_total", "Votes recorded"),
            registry
        )
        .expect("failed to register votes_accepted counter");

        let votes_rejected = register_int_counter_vec_with_registry!(
            Opts::new("tally_votes_rejected_total", "Votes rejected, by reason"),
            &["reason"],
            registry
        )
        .expect("failed to register votes_rejected counter");

        let close_attempts = register_int_counter_vec_with_registry!(
            Opts::new("tally_close_attempts_total", "End-voting attempts, by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register close_attempts counter");

        let candidate_count = register_int_gauge_with_registry!(
            Opts::new("tally_candidate_count", "Number of candidates on the ballot"),
            registry
        )
        .expect("failed to register candidate_count gauge");

        let voter_count = register_int_gauge_with_registry!(
            Opts::new("tally_voter_count", "Identities that have voted"),
            registry
        )
        .expect("failed to register voter_count gauge");

        let voting_open = register_int_gauge_with_registry!(
            Opts::new("tally_voting_open", "1 while voting is open"),
            registry
        )
        .expect("failed to register voting_open gauge");

        let command_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "tally_command_latency_ms",
                "Command latency from enqueue to reply in milliseconds"
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 50.0, 250.0]),
            registry
        )
        .expect("failed to register command_latency_ms histogram");

        Self {
            registry,
            votes_accepted,
            votes_rejected,
            close_attempts,
            candidate_count,
            voter_count,
            voting_open,
            command_latency_ms,
        }
    }

    /// Refresh the gauges from committed state.
    pub fn observe(&self, election: &Election) {
        self.candidate_count.set(election.candidate_count() as i64);
        self.voter_count.set(election.voter_count() as i64);
        self.voting_open.set(i64::from(election.voting_open()));
    }

    pub fn record_vote(&self, result: &Result<u64, ElectionError>) {
        match result {
            Ok(_) => self.votes_accepted.inc(),
            Err(e) => self.votes_rejected.with_label_values(&[e.kind()]).inc(),
        }
    }

    pub fn record_close<T>(&self, result: &Result<T, ElectionError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.close_attempts.with_label_values(&[outcome]).inc();
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for ElectionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
