use tally_election::ElectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("election error: {0}")]
    Election(#[from] ElectionError),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("command queue full, try again later")]
    QueueFull,

    #[error("election service has stopped")]
    ServiceStopped,

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// The core rejection, if this error is one.
    pub fn as_election(&self) -> Option<&ElectionError> {
        match self {
            Self::Election(e) => Some(e),
            _ => None,
        }
    }
}
