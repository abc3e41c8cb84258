//! Election host configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tally_election::Election;
use tally_types::Identity;

use crate::{snapshot_store, NodeError};

/// Configuration for a tally node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Administrator identity; the only caller allowed to end voting.
    #[serde(default)]
    pub owner: String,

    /// Candidate names, in ballot order.
    #[serde(default)]
    pub candidates: Vec<String>,

    /// Capacity of the pending-command queue in front of the writer.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Where to persist the election snapshot. Unset means in-memory only.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_queue_capacity() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Check the fields that have no usable default.
    pub fn validate(&self) -> Result<(), NodeError> {
        if !Identity::new(self.owner.as_str()).is_valid() {
            return Err(NodeError::Config("owner must be a non-empty identity".into()));
        }
        if self.candidates.is_empty() {
            return Err(NodeError::Config("at least one candidate is required".into()));
        }
        if self.queue_capacity == 0 {
            return Err(NodeError::Config("queue_capacity must be positive".into()));
        }
        if !matches!(self.log_format.as_str(), "human" | "json") {
            return Err(NodeError::Config(format!(
                "unknown log_format {:?}",
                self.log_format
            )));
        }
        Ok(())
    }

    /// A fresh election from `owner` and `candidates`.
    pub fn build_election(&self) -> Result<Election, NodeError> {
        self.validate()?;
        Ok(Election::new(
            Identity::new(self.owner.as_str()),
            self.candidates.iter().cloned(),
        )?)
    }

    /// Restore from `snapshot_path` when a snapshot exists there, otherwise
    /// build a fresh election.
    ///
    /// A restored election must have the configured owner and candidate
    /// names; anything else means the file belongs to a different ballot.
    pub fn load_election(&self) -> Result<Election, NodeError> {
        self.validate()?;
        let Some(path) = &self.snapshot_path else {
            return self.build_election();
        };
        let Some(election) = snapshot_store::load(path)? else {
            return self.build_election();
        };

        if election.owner().as_str() != self.owner {
            return Err(NodeError::Snapshot(format!(
                "{} was written for owner {}, config says {}",
                path.display(),
                election.owner(),
                self.owner
            )));
        }
        let names: Vec<String> = election.candidates().into_iter().map(|c| c.name).collect();
        if names != self.candidates {
            return Err(NodeError::Snapshot(format!(
                "{} holds a different candidate list",
                path.display()
            )));
        }
        tracing::info!(
            path = %path.display(),
            votes = election.total_votes(),
            state = %election.state(),
            "election restored from snapshot"
        );
        Ok(election)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            candidates: Vec::new(),
            queue_capacity: default_queue_capacity(),
            snapshot_path: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
