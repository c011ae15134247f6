//! Dedicated store thread with per-write acknowledgement channels.
//!
//! # Responsibility
//! - Own one `LabelStore` on a background thread.
//! - Queue inserts without blocking the submitting caller.
//! - Serve snapshots through the same queue.
//!
//! # Invariants
//! - Jobs run in FIFO order: a snapshot requested after an insert observes it.
//! - Every insert outcome is either delivered to its `PendingWrite` or logged.
//! - Dropping the worker drains queued jobs before the thread exits.

use crate::model::label::{LabelEvent, LabelId, StoredLabel};
use crate::repo::label_repo::{LabelStore, RepoError, RepoResult};
use log::{debug, error, info};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "signlabel-store";

enum Job {
    Insert {
        event: LabelEvent,
        reply: Sender<RepoResult<LabelId>>,
    },
    Snapshot {
        reply: Sender<RepoResult<Vec<StoredLabel>>>,
    },
}

/// Handle to one queued insert.
///
/// Callers may `wait()` for durability or drop the handle; a dropped handle
/// does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    receiver: Receiver<RepoResult<LabelId>>,
}

impl PendingWrite {
    /// Blocks until the store acknowledges the write.
    pub fn wait(self) -> RepoResult<LabelId> {
        self.receiver.recv().unwrap_or_else(|_| {
            Err(RepoError::Unavailable(
                "store worker stopped before acknowledging write".to_string(),
            ))
        })
    }

    /// Returns the outcome if the store has already handled the write.
    pub fn try_result(&self) -> Option<RepoResult<LabelId>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RepoError::Unavailable(
                "store worker stopped before acknowledging write".to_string(),
            ))),
        }
    }
}

/// Background owner of a label store.
pub struct StoreWorker {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWorker {
    /// Spawns the worker thread and opens the store inside it.
    ///
    /// The store itself never crosses threads, so `S` need not be `Send`.
    ///
    /// # Errors
    /// - Returns the `open` error when the store cannot be created.
    /// - Returns `RepoError::Unavailable` when the thread cannot be spawned.
    pub fn spawn<S, F>(open: F) -> RepoResult<Self>
    where
        S: LabelStore + 'static,
        F: FnOnce() -> RepoResult<S> + Send + 'static,
    {
        let (sender, jobs) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<RepoResult<()>>();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let store = match open() {
                    Ok(store) => {
                        let _ = ready_tx.send(Ok(()));
                        store
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                run_jobs(&store, jobs);
            })
            .map_err(|err| RepoError::Unavailable(format!("cannot spawn store worker: {err}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("event=store_worker_start module=repo status=ok");
                Ok(Self {
                    sender: Some(sender),
                    handle: Some(handle),
                })
            }
            Ok(Err(err)) => {
                error!("event=store_worker_start module=repo status=error error={err}");
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(RepoError::Unavailable(
                    "store worker exited during startup".to_string(),
                ))
            }
        }
    }

    /// Moves an already constructed store onto the worker thread.
    pub fn with_store<S>(store: S) -> RepoResult<Self>
    where
        S: LabelStore + Send + 'static,
    {
        Self::spawn(move || Ok(store))
    }

    /// Queues one insert and returns immediately.
    pub fn submit(&self, event: LabelEvent) -> PendingWrite {
        let (reply, receiver) = mpsc::channel();
        if let Some(sender) = &self.sender {
            if let Err(mpsc::SendError(job)) = sender.send(Job::Insert { event, reply }) {
                if let Job::Insert { event, reply } = job {
                    error!(
                        "event=label_insert module=repo status=error error_code=worker_stopped image={}",
                        event.image
                    );
                    let _ = reply.send(Err(RepoError::Unavailable(
                        "store worker is not running".to_string(),
                    )));
                }
            }
        }
        PendingWrite { receiver }
    }

    /// Reads a full snapshot after every previously queued job.
    pub fn snapshot(&self) -> RepoResult<Vec<StoredLabel>> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| RepoError::Unavailable("store worker is not running".to_string()))?;
        let (reply, receiver) = mpsc::channel();
        sender
            .send(Job::Snapshot { reply })
            .map_err(|_| RepoError::Unavailable("store worker is not running".to_string()))?;
        receiver.recv().unwrap_or_else(|_| {
            Err(RepoError::Unavailable(
                "store worker stopped before answering snapshot".to_string(),
            ))
        })
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=store_worker_stop module=repo status=error error_code=worker_panicked");
            }
        }
    }
}

fn run_jobs<S: LabelStore>(store: &S, jobs: Receiver<Job>) {
    for job in jobs {
        match job {
            Job::Insert { event, reply } => {
                let result = store.insert(&event);
                match &result {
                    Ok(id) => debug!(
                        "event=label_insert module=repo status=ok id={id} categories={}",
                        event.categories.len()
                    ),
                    Err(err) => error!(
                        "event=label_insert module=repo status=error image={} error={err}",
                        event.image
                    ),
                }
                if reply.send(result).is_err() {
                    debug!("event=label_insert module=repo status=unobserved");
                }
            }
            Job::Snapshot { reply } => {
                let _ = reply.send(store.select_all());
            }
        }
    }
    info!("event=store_worker_stop module=repo status=ok");
}
