//! Fire-and-forget persistence.
//!
//! Mutators hand a snapshot to a [`Persister`] and return immediately. A single
//! background task drains the queue in order and writes each snapshot to the
//! [`StateStore`], so a stale snapshot can never land after a newer one.
//!
//! # Status
//!
//! ```text
//!   Persisted ──enqueue──▶ Dirty ──newest write ok──▶ Persisted
//!                           │
//!                           └──write failed──▶ Dirty (warning logged)
//! ```
//!
//! A failed write is retried with exponential backoff unless a newer snapshot
//! is already queued behind it. Since every snapshot is the whole graph, the
//! next successful write also covers anything an earlier failure missed.
//! In-memory state is never rolled back.

use super::config::EngineConfig;
use crate::error::{GraphError, Result};
use crate::storage::StateStore;
use crate::types::GraphState;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;

/// Whether the newest in-memory state has reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// Every enqueued snapshot has been written
    Persisted,
    /// A snapshot is queued, in flight, or its write failed
    Dirty,
}

#[derive(Debug)]
struct Tracker {
    status: PersistenceStatus,
    queued: usize,
    last_error: Option<String>,
}

enum Command {
    Save(Box<GraphState>),
    Flush(oneshot::Sender<Result<()>>),
}

/// Handle to the background writer.
///
/// Dropping the handle closes the queue; the writer finishes what is already
/// queued and exits.
pub struct Persister {
    tx: mpsc::UnboundedSender<Command>,
    tracker: Arc<Mutex<Tracker>>,
}

impl Persister {
    /// Spawn the writer task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(store: Arc<dyn StateStore>, config: &EngineConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = Arc::new(Mutex::new(Tracker {
            status: PersistenceStatus::Persisted,
            queued: 0,
            last_error: None,
        }));

        let writer = Writer {
            store,
            key: config.storage_key.clone(),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            enable_logging: config.enable_logging,
            tracker: Arc::clone(&tracker),
        };
        tokio::spawn(writer.run(rx));

        Persister { tx, tracker }
    }

    /// Queue `state` for writing. Never blocks.
    pub fn enqueue(&self, state: GraphState) {
        {
            let mut tracker = self.tracker.lock();
            tracker.queued += 1;
            tracker.status = PersistenceStatus::Dirty;
        }
        if self.tx.send(Command::Save(Box::new(state))).is_err() {
            let mut tracker = self.tracker.lock();
            tracker.queued = tracker.queued.saturating_sub(1);
            tracker.last_error = Some(GraphError::PersistenceClosed.to_string());
            tracing::warn!("persistence writer is gone; snapshot kept in memory only");
        }
    }

    /// Wait until everything queued before this call has been attempted.
    ///
    /// Returns the outcome of the newest write: `Ok` when the store holds the
    /// latest state, otherwise the error that left it dirty.
    pub async fn flush(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| GraphError::PersistenceClosed)?;
        done.await.map_err(|_| GraphError::PersistenceClosed)?
    }

    /// Current status.
    pub fn status(&self) -> PersistenceStatus {
        self.tracker.lock().status
    }

    /// Message of the most recent failed write, if the state is still dirty.
    pub fn last_error(&self) -> Option<String> {
        self.tracker.lock().last_error.clone()
    }
}

struct Writer {
    store: Arc<dyn StateStore>,
    key: String,
    max_retries: u32,
    retry_delay_ms: u64,
    enable_logging: bool,
    tracker: Arc<Mutex<Tracker>>,
}

impl Writer {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Save(state) => {
                    let result = self.write_with_retries(&state).await;
                    self.record(result);
                }
                Command::Flush(reply) => {
                    let tracker = self.tracker.lock();
                    let outcome = match (&tracker.status, &tracker.last_error) {
                        (PersistenceStatus::Dirty, Some(message)) => {
                            Err(GraphError::Storage(message.clone()))
                        }
                        _ => Ok(()),
                    };
                    drop(tracker);
                    let _ = reply.send(outcome);
                }
            }
        }
        tracing::trace!("persistence writer stopped");
    }

    async fn write_with_retries(&self, state: &GraphState) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.store.save(&self.key, state).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.max_retries && !self.superseded() => {
                    let delay = exponential_backoff(attempt, self.retry_delay_ms);
                    if self.enable_logging {
                        tracing::warn!(
                            "Save failed (attempt {}), retrying after {:?}: {}",
                            attempt + 1,
                            delay,
                            e
                        );
                    }
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A newer snapshot is queued behind the one being written.
    fn superseded(&self) -> bool {
        self.tracker.lock().queued > 1
    }

    fn record(&self, result: Result<()>) {
        let mut tracker = self.tracker.lock();
        tracker.queued = tracker.queued.saturating_sub(1);
        match result {
            Ok(()) => {
                tracker.last_error = None;
                if tracker.queued == 0 {
                    tracker.status = PersistenceStatus::Persisted;
                }
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to persist graph state");
                tracker.last_error = Some(e.to_string());
                tracker.status = PersistenceStatus::Dirty;
            }
        }
    }
}

/// Backoff delay for retry `attempt` (0-based), capped at 2^10 times the base.
pub fn exponential_backoff(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2_u64.pow(attempt.min(10)));
    Duration::from_millis(delay_ms)
}
