//! Background relay that keeps draining the outbox.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use super::worker::OutboxWorker;
use crate::bus::Publisher;
use crate::model::ModelStore;

/// Statistics from the relay thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub messages_published: usize,
    pub messages_released: usize,
    pub messages_failed: usize,
    pub drain_errors: usize,
    pub polls: usize,
}

/// A thread that drains the outbox every `poll_interval` until stopped.
///
/// ```ignore
/// let relay = OutboxWorkerThread::spawn(
///     store.clone(),
///     OutboxWorker::new(queue.clone()).with_worker_id("relay-1"),
///     Duration::from_millis(20),
/// );
/// // ... place orders ...
/// let stats = relay.stop();
/// ```
pub struct OutboxWorkerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<WorkerStats>>,
    live: Arc<Mutex<WorkerStats>>,
}

impl OutboxWorkerThread {
    pub fn spawn<S, P>(store: S, worker: OutboxWorker<P>, poll_interval: Duration) -> Self
    where
        S: ModelStore + 'static,
        P: Publisher + 'static,
    {
        let (stop_tx, stop_rx) = channel();
        let live = Arc::new(Mutex::new(WorkerStats::default()));
        let published = Arc::clone(&live);

        let handle = thread::spawn(move || {
            let mut stats = WorkerStats::default();
            info!(worker_id = worker.worker_id(), "outbox relay started");

            loop {
                stats.polls += 1;
                match worker.drain(&store) {
                    Ok(drained) => {
                        stats.messages_published += drained.completed;
                        stats.messages_released += drained.released;
                        stats.messages_failed += drained.failed;
                    }
                    Err(err) => {
                        stats.drain_errors += 1;
                        error!(worker_id = worker.worker_id(), error = %err, "outbox drain failed");
                    }
                }
                *published.lock().unwrap_or_else(PoisonError::into_inner) = stats;

                match stop_rx.recv_timeout(poll_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            info!(
                worker_id = worker.worker_id(),
                published = stats.messages_published,
                "outbox relay stopped"
            );
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
            live,
        }
    }

    /// Statistics so far, while the relay keeps running.
    pub fn stats(&self) -> WorkerStats {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Signal the relay to stop, wait for the current drain to finish and
    /// return its statistics.
    pub fn stop(mut self) -> WorkerStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => WorkerStats::default(),
        }
    }
}

impl Drop for OutboxWorkerThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
