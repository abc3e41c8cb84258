//! Serialized command processing for one election.
//!
//! [`ElectionService`] is the only way the host touches an [`Election`].
//! Writes are queued on a bounded channel and applied one at a time by a
//! single writer task holding the write lock, so no caller ever observes a
//! half-applied vote. Reads take the read lock and see committed state only.
//!
//! With a snapshot path configured, the writer saves the state a command
//! will produce before committing it, and replies only after both. A failed
//! save refuses the command and stops the writer, so memory never holds a
//! vote the disk could forget.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use tally_election::{Election, ElectionError, ElectionEvent, ElectionSnapshot};
use tally_types::{Candidate, CandidateIndex, ElectionState, Identity, Winner};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::ElectionMetrics;
use crate::snapshot_store;
use crate::tracing_spans::{end_voting_span, vote_span};

/// Capacity of the committed-event broadcast channel. Slow subscribers
/// that fall further behind than this see `RecvError::Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A mutating request waiting for the writer.
#[derive(Debug)]
pub enum Command {
    Vote {
        caller: Identity,
        index: CandidateIndex,
        reply: oneshot::Sender<Result<u64, NodeError>>,
    },
    EndVoting {
        caller: Identity,
        reply: oneshot::Sender<Result<Winner, NodeError>>,
    },
}

struct Queued {
    command: Command,
    enqueued_at: Instant,
}

/// The reply to a command accepted by [`ElectionService::try_vote`] or
/// [`ElectionService::try_end_voting`].
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, NodeError>>,
}

impl<T> Pending<T> {
    /// Wait for the writer to commit or reject the command.
    pub async fn wait(self) -> Result<T, NodeError> {
        self.rx.await.map_err(|_| NodeError::ServiceStopped)?
    }
}

/// Cloneable handle to a running election.
#[derive(Clone)]
pub struct ElectionService {
    commands: mpsc::Sender<Queued>,
    state: Arc<RwLock<Election>>,
    events: broadcast::Sender<ElectionEvent>,
    metrics: Arc<ElectionMetrics>,
}

impl ElectionService {
    /// Start the writer task for `election`.
    ///
    /// The writer stops when `shutdown` fires (or its controller is dropped)
    /// or when every handle has been dropped. Commands already queued at
    /// that point are still applied. It also stops after a failed snapshot
    /// save; commands still queued then fail with
    /// [`NodeError::ServiceStopped`].
    pub fn spawn(
        mut election: Election,
        config: &NodeConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> (Self, JoinHandle<()>) {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let forward = events.clone();
        election.subscribe(Box::new(move |event| {
            // No subscribers is fine.
            let _ = forward.send(event.clone());
        }));

        let metrics = Arc::new(ElectionMetrics::new());
        metrics.observe(&election);

        let (commands, rx) = mpsc::channel(config.queue_capacity.max(1));
        let state = Arc::new(RwLock::new(election));

        let writer = Writer {
            state: Arc::clone(&state),
            metrics: Arc::clone(&metrics),
            snapshot_path: config.snapshot_path.clone(),
        };
        let handle = tokio::spawn(writer.run(rx, shutdown));

        let service = Self {
            commands,
            state,
            events,
            metrics,
        };
        (service, handle)
    }

    // ── Writes ─────────────────────────────────────────────────────────

    /// Cast a vote, waiting for queue space if the writer is behind.
    /// Returns the candidate's new count.
    pub async fn vote(&self, caller: Identity, index: CandidateIndex) -> Result<u64, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Vote { caller, index, reply }).await?;
        Pending { rx }.wait().await
    }

    /// Close voting, waiting for queue space. Returns the final winner.
    pub async fn end_voting(&self, caller: Identity) -> Result<Winner, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::EndVoting { caller, reply }).await?;
        Pending { rx }.wait().await
    }

    /// Queue a vote without waiting; fails with [`NodeError::QueueFull`]
    /// when the queue is at capacity.
    pub fn try_vote(&self, caller: Identity, index: CandidateIndex) -> Result<Pending<u64>, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.try_submit(Command::Vote { caller, index, reply })?;
        Ok(Pending { rx })
    }

    /// Queue an end-voting request without waiting.
    pub fn try_end_voting(&self, caller: Identity) -> Result<Pending<Winner>, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.try_submit(Command::EndVoting { caller, reply })?;
        Ok(Pending { rx })
    }

    /// Enqueue a raw command, waiting for space.
    pub async fn submit(&self, command: Command) -> Result<(), NodeError> {
        self.commands
            .send(Queued {
                command,
                enqueued_at: Instant::now(),
            })
            .await
            .map_err(|_| NodeError::ServiceStopped)
    }

    /// Enqueue a raw command or fail immediately.
    pub fn try_submit(&self, command: Command) -> Result<(), NodeError> {
        use mpsc::error::TrySendError;
        self.commands
            .try_send(Queued {
                command,
                enqueued_at: Instant::now(),
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => NodeError::QueueFull,
                TrySendError::Closed(_) => NodeError::ServiceStopped,
            })
    }

    // ── Reads ──────────────────────────────────────────────────────────

    async fn read<T>(&self, f: impl FnOnce(&Election) -> T) -> T {
        let election = self.state.read().await;
        f(&election)
    }

    pub async fn owner(&self) -> Identity {
        self.read(|e| e.owner().clone()).await
    }

    pub async fn candidates(&self) -> Vec<Candidate> {
        self.read(Election::candidates).await
    }

    pub async fn has_voted(&self, identity: &Identity) -> bool {
        self.read(|e| e.has_voted(identity)).await
    }

    pub async fn voting_open(&self) -> bool {
        self.read(Election::voting_open).await
    }

    pub async fn state(&self) -> ElectionState {
        self.read(Election::state).await
    }

    pub async fn winner(&self) -> Winner {
        self.read(Election::winner).await
    }

    /// The current leader and whether it is final, read together.
    pub async fn standing(&self) -> (Winner, bool) {
        self.read(|e| (e.winner(), !e.voting_open())).await
    }

    pub async fn outcome(&self) -> Option<Winner> {
        self.read(Election::outcome).await
    }

    pub async fn snapshot(&self) -> ElectionSnapshot {
        self.read(Election::snapshot).await
    }

    /// Committed events, in commit order.
    pub fn subscribe(&self) -> broadcast::Receiver<ElectionEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &ElectionMetrics {
        &self.metrics
    }

    /// Whether the writer is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

struct Writer {
    state: Arc<RwLock<Election>>,
    metrics: Arc<ElectionMetrics>,
    snapshot_path: Option<PathBuf>,
}

impl Writer {
    fn run(
        self,
        mut rx: mpsc::Receiver<Queued>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> impl Future<Output = ()> + Send {
        async move {
            info!("election writer started");
            loop {
                tokio::select! {
                    biased;
                    queued = rx.recv() => match queued {
                        Some(queued) => {
                            if !self.apply(queued).await {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = shutdown.recv() => {
                        rx.close();
                        while let Some(queued) = rx.recv().await {
                            if !self.apply(queued).await {
                                break;
                            }
                        }
                        break;
                    }
                }
            }
            info!("election writer stopped");
        }
    }

    /// Apply one command and reply. Returns `false` once the writer has to
    /// stop taking writes.
    async fn apply(&self, queued: Queued) -> bool {
        let healthy = match queued.command {
            Command::Vote {
                caller,
                index,
                reply,
            } => {
                let result = self
                    .commit(
                        |e| e.preview_vote(&caller, index),
                        |e| {
                            let result = vote_span(caller.as_str(), index)
                                .in_scope(|| e.vote(&caller, index));
                            self.metrics.record_vote(&result);
                            result
                        },
                    )
                    .await;
                let healthy = !matches!(result, Err(NodeError::Snapshot(_)));
                if reply.send(result).is_err() {
                    debug!("vote caller went away before the reply");
                }
                healthy
            }
            Command::EndVoting { caller, reply } => {
                let result = self
                    .commit(
                        |e| e.preview_end_voting(&caller),
                        |e| {
                            let result = end_voting_span(caller.as_str())
                                .in_scope(|| e.end_voting(&caller));
                            self.metrics.record_close(&result);
                            result
                        },
                    )
                    .await;
                let healthy = !matches!(result, Err(NodeError::Snapshot(_)));
                if reply.send(result).is_err() {
                    debug!("end-voting caller went away before the reply");
                }
                healthy
            }
        };

        self.metrics
            .command_latency_ms
            .observe(queued.enqueued_at.elapsed().as_secs_f64() * 1000.0);
        healthy
    }

    /// Persist what `preview` says the command will produce, then run
    /// `apply` under the write lock.
    ///
    /// Nothing else writes, so `apply` sees the same state `preview` did and
    /// either commits exactly the saved snapshot or rejects as the preview
    /// did.
    async fn commit<T>(
        &self,
        preview: impl FnOnce(&Election) -> Result<ElectionSnapshot, ElectionError>,
        apply: impl FnOnce(&mut Election) -> Result<T, ElectionError>,
    ) -> Result<T, NodeError> {
        self.persist(preview).await?;
        let mut election = self.state.write().await;
        let result = apply(&mut *election);
        if result.is_ok() {
            self.metrics.observe(&election);
        }
        Ok(result?)
    }

    /// Save the previewed state. File I/O runs on the blocking pool with no
    /// lock held. A rejected preview has nothing to save.
    async fn persist(
        &self,
        preview: impl FnOnce(&Election) -> Result<ElectionSnapshot, ElectionError>,
    ) -> Result<(), NodeError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let next = match preview(&*self.state.read().await) {
            Ok(next) => next,
            Err(_) => return Ok(()),
        };

        let target = path.clone();
        let saved = tokio::task::spawn_blocking(move || snapshot_store::save(&target, &next))
            .await
            .map_err(|e| NodeError::Snapshot(format!("snapshot task failed: {e}")))
            .and_then(|saved| saved);
        if let Err(e) = saved {
            error!(path = %path.display(), "failed to persist snapshot, refusing writes: {e}");
            return Err(NodeError::Snapshot(format!(
                "could not persist {}: {e}",
                path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::shutdown::ShutdownController;

    fn id(s: &str) -> Identity {
        Identity::from(s)
    }

    fn config() -> NodeConfig {
        NodeConfig {
            owner: "owner".into(),
            candidates: vec!["Alice".into(), "Bob".into(), "Carol".into()],
            ..NodeConfig::default()
        }
    }

    fn start(config: &NodeConfig) -> (ElectionService, JoinHandle<()>, ShutdownController) {
        let shutdown = ShutdownController::new();
        let election = config.build_election().unwrap();
        let (service, handle) = ElectionService::spawn(election, config, shutdown.subscribe());
        (service, handle, shutdown)
    }

    async fn counts(service: &ElectionService) -> Vec<u64> {
        service
            .candidates()
            .await
            .iter()
            .map(|c| c.vote_count)
            .collect()
    }

    #[tokio::test]
    async fn end_to_end_through_the_queue() {
        let (service, _handle, _shutdown) = start(&config());

        assert_eq!(service.vote(id("V1"), 1).await.unwrap(), 1);
        assert_eq!(counts(&service).await, vec![0, 1, 0]);
        assert!(service.has_voted(&id("V1")).await);

        let err = service.vote(id("V1"), 0).await.unwrap_err();
        assert_eq!(
            err.as_election(),
            Some(&ElectionError::DuplicateVote(id("V1")))
        );
        assert_eq!(counts(&service).await, vec![0, 1, 0]);

        let winner = service.end_voting(id("owner")).await.unwrap();
        assert!(!service.voting_open().await);
        assert_eq!((winner.name.as_str(), winner.votes), ("Bob", 1));
        assert_eq!(service.outcome().await, Some(winner));
        assert_eq!(service.owner().await, id("owner"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_voters_stay_balanced() {
        let (service, _handle, _shutdown) = start(&config());

        let mut tasks = Vec::new();
        for n in 0..60 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                // Every identity tries twice; only one attempt may land.
                let voter = id(&format!("voter-{}", n % 30));
                service.vote(voter, n % 3).await
            }));
        }
        let mut accepted = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 30);
        let snapshot = service.snapshot().await;
        let total: u64 = snapshot.candidates.iter().map(|c| c.vote_count).sum();
        assert_eq!(total, 30);
        assert_eq!(snapshot.voters.len(), 30);
        assert_eq!(service.metrics().votes_accepted.get(), 30);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_closers_close_once() {
        let (service, _handle, _shutdown) = start(&config());
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move { service.end_voting(id("owner")).await }));
        }
        let mut ok = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert_eq!(e.as_election(), Some(&ElectionError::AlreadyClosed)),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn events_are_published_after_commit() {
        let (service, _handle, _shutdown) = start(&config());
        let mut events = service.subscribe();

        service.vote(id("V1"), 2).await.unwrap();
        let _ = service.vote(id("V1"), 2).await;
        service.end_voting(id("owner")).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            ElectionEvent::VoteCast {
                voter: id("V1"),
                candidate: 2,
                new_count: 1
            }
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            ElectionEvent::VotingEnded { .. }
        ));
    }

    #[tokio::test]
    async fn full_queue_fails_fast() {
        let config = NodeConfig {
            queue_capacity: 1,
            ..config()
        };
        let (service, _handle, _shutdown) = start(&config);

        // Hold the read lock so the writer parks on its first command.
        let guard = service.state.read().await;
        let first = service.try_vote(id("a"), 0).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = service.try_vote(id("b"), 1).unwrap();
        assert!(matches!(
            service.try_vote(id("c"), 2),
            Err(NodeError::QueueFull)
        ));
        drop(guard);

        assert_eq!(first.wait().await.unwrap(), 1);
        assert_eq!(second.wait().await.unwrap(), 1);
        assert!(!service.has_voted(&id("c")).await);
    }

    #[tokio::test]
    async fn shutdown_drains_then_stops() {
        let (service, handle, shutdown) = start(&config());
        let pending = service.try_vote(id("V1"), 0).unwrap();
        shutdown.shutdown();
        assert_eq!(pending.wait().await.unwrap(), 1);
        handle.await.unwrap();

        assert!(!service.is_running());
        assert!(matches!(
            service.vote(id("V2"), 0).await,
            Err(NodeError::ServiceStopped)
        ));
        // Reads keep working on the final state.
        assert!(service.has_voted(&id("V1")).await);
    }

    #[tokio::test]
    async fn failed_save_refuses_the_vote_and_stops_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            snapshot_path: Some(dir.path().join("missing-dir").join("election.snapshot")),
            ..config()
        };
        let (service, handle, _shutdown) = start(&config);

        // Rejections have nothing to save and leave the writer running.
        let err = service.vote(id("V1"), 7).await.unwrap_err();
        assert!(matches!(
            err.as_election(),
            Some(ElectionError::InvalidCandidate { .. })
        ));
        assert!(service.is_running());

        assert!(matches!(
            service.vote(id("V1"), 0).await,
            Err(NodeError::Snapshot(_))
        ));
        assert!(!service.has_voted(&id("V1")).await);
        assert_eq!(counts(&service).await, vec![0, 0, 0]);
        assert_eq!(service.metrics().votes_accepted.get(), 0);

        handle.await.unwrap();
        assert!(!service.is_running());
        assert!(matches!(
            service.vote(id("V2"), 0).await,
            Err(NodeError::ServiceStopped)
        ));
    }

    #[tokio::test]
    async fn standing_reports_leader_and_finality() {
        let (service, _handle, _shutdown) = start(&config());
        service.vote(id("V1"), 2).await.unwrap();

        let (leader, is_final) = service.standing().await;
        assert_eq!((leader.index, is_final), (2, false));

        service.end_voting(id("owner")).await.unwrap();
        let (leader, is_final) = service.standing().await;
        assert_eq!((leader.index, is_final), (2, true));
    }

    #[tokio::test]
    async fn committed_mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.snapshot");
        let config = NodeConfig {
            snapshot_path: Some(path.clone()),
            ..config()
        };
        let (service, _handle, _shutdown) = start(&config);

        service.vote(id("V1"), 1).await.unwrap();
        let _ = service.end_voting(id("V1")).await;

        let restored = snapshot_store::load(&path).unwrap().expect("snapshot written");
        assert!(restored.has_voted(&id("V1")));
        assert!(restored.voting_open());
    }
}
