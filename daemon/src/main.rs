//! tally daemon: runs one election and serves the line protocol on stdin.

mod handler;
mod request;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use tally_election::Election;
use tally_node::{init_logging, ElectionService, LogFormat, NodeConfig, ShutdownController};

#[derive(Parser)]
#[command(name = "tally-daemon", about = "Single-ballot election ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Administrator identity.
    #[arg(long, env = "TALLY_OWNER")]
    owner: Option<String>,

    /// Candidate names in ballot order (comma-separated: "Alice,Bob,Carol").
    #[arg(long, env = "TALLY_CANDIDATES", value_delimiter = ',')]
    candidates: Vec<String>,

    /// Snapshot file to restore from and persist to.
    #[arg(long, env = "TALLY_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Pending-command queue capacity.
    #[arg(long, env = "TALLY_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve requests from stdin until EOF or a shutdown signal.
    Run,
    /// Print the current election state as JSON and exit.
    Status,
    /// Print an example configuration file.
    InitConfig,
}

impl Cli {
    /// File settings (if any) with flags and env vars layered on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NodeConfig::default(),
        };
        if let Some(owner) = &self.owner {
            config.owner = owner.clone();
        }
        if !self.candidates.is_empty() {
            config.candidates = self.candidates.clone();
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = Some(snapshot.clone());
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn example_config() -> NodeConfig {
    NodeConfig {
        owner: "0x0000000000000000000000000000000000000001".into(),
        candidates: vec!["Alice".into(), "Bob".into(), "Carol".into()],
        snapshot_path: Some(PathBuf::from("./tally.snapshot")),
        ..NodeConfig::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::InitConfig => print!("{}", example_config().to_toml_string()),
        Command::Status => {
            let (_, election) = prepare(&cli)?;
            let status = json!({
                "owner": election.owner(),
                "state": election.state().to_string(),
                "candidates": election.candidates(),
                "total_votes": election.total_votes(),
                "winner": election.winner(),
                "outcome": election.outcome(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Run => {
            let (config, election) = prepare(&cli)?;
            run(election, &config).await?;
        }
    }

    Ok(())
}

/// Resolve the config, start logging, and load the election.
fn prepare(cli: &Cli) -> anyhow::Result<(NodeConfig, Election)> {
    let config = cli.node_config()?;
    config.validate()?;
    init_logging(config.log_format.parse::<LogFormat>()?, &config.log_level);
    let election = config.load_election()?;
    Ok((config, election))
}

async fn run(election: Election, config: &NodeConfig) -> anyhow::Result<()> {
    tracing::info!(
        owner = %election.owner(),
        candidates = election.candidate_count(),
        state = %election.state(),
        "starting tally daemon"
    );

    let shutdown = Arc::new(ShutdownController::new());
    let (service, writer) = ElectionService::spawn(election, config, shutdown.subscribe());

    let signals = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };

    let mut stop = shutdown.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    let reply = handler::handle_line(&service, &line).await;
                    println!("{reply}");
                }
                None => {
                    tracing::info!("end of input");
                    break;
                }
            },
            _ = stop.recv() => break,
        }
    }

    shutdown.shutdown();
    signals.abort();
    writer.await.context("election writer panicked")?;

    tracing::info!("tally daemon exited cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_is_valid() {
        let config = example_config();
        config.validate().unwrap();
        let reparsed = NodeConfig::from_toml_str(&config.to_toml_string()).unwrap();
        assert_eq!(reparsed.candidates, config.candidates);
    }

    #[test]
    fn flags_build_a_config_without_a_file() {
        let cli = Cli::parse_from([
            "tally-daemon",
            "--owner",
            "admin",
            "--candidates",
            "Alice,Bob",
            "--queue-capacity",
            "16",
            "run",
        ]);
        let config = cli.node_config().unwrap();
        assert_eq!(config.owner, "admin");
        assert_eq!(config.candidates, vec!["Alice", "Bob"]);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.log_level, "info");
        assert!(matches!(cli.command, Command::Run));
    }
}
