//! Single-worker FIFO queue for engine calls
//!
//! Every operation runs on one dedicated thread that owns the executor, one
//! at a time, in the order it was enqueued. There is no partitioning by
//! note: unrelated operations are serialized as strictly as related ones.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::executor::CommandExecutor;
use crate::error::{Result, StoreError};

type Job = Box<dyn FnOnce(&mut dyn CommandExecutor) -> bool + Send>;

/// Counters reported when the queue shuts down
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub completed: usize,
    pub failed: usize,
}

/// Result of an enqueued operation, available once the worker reaches it
#[derive(Debug)]
#[must_use = "a pending operation reports its failure only through wait()"]
pub struct Pending<T> {
    rx: Receiver<Result<T>>,
}

impl<T> Pending<T> {
    /// An already settled operation
    pub fn ready(result: Result<T>) -> Self {
        let (tx, rx) = bounded(1);
        let _ = tx.send(result);
        Self { rx }
    }

    /// Block until the operation settles
    pub fn wait(self) -> Result<T> {
        self.rx.recv().unwrap_or(Err(StoreError::QueueClosed))
    }
}

/// Owns the executor and the worker thread draining operations
pub struct WriteQueue {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<QueueStats>>,
}

impl WriteQueue {
    /// Move `executor` onto a new worker thread
    pub fn start(executor: Box<dyn CommandExecutor>) -> Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let description = executor.describe();

        let handle = thread::Builder::new()
            .name("notestore-writer".to_string())
            .spawn(move || worker_loop(executor, rx))?;

        tracing::debug!(engine = %description, "write queue started");

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Append an operation. It runs after everything enqueued before it has
    /// settled, whether that succeeded or failed.
    pub fn enqueue<T, F>(&self, operation: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn CommandExecutor) -> Result<T> + Send + 'static,
    {
        let (result_tx, rx) = bounded(1);

        let job: Job = Box::new(move |executor: &mut dyn CommandExecutor| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| operation(executor)))
                .unwrap_or_else(|_| {
                    Err(StoreError::Other("queued operation panicked".to_string()))
                });
            let ok = result.is_ok();
            let _ = result_tx.send(result);
            ok
        });

        if let Some(tx) = &self.tx {
            // A send error drops the job and with it the result sender, so
            // wait() reports QueueClosed
            let _ = tx.send(job);
        }

        Pending { rx }
    }

    /// Stop accepting work, drain what is queued and join the worker
    pub fn shutdown(mut self) -> Result<QueueStats> {
        self.close()
    }

    fn close(&mut self) -> Result<QueueStats> {
        drop(self.tx.take());
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StoreError::Other("write queue worker panicked".to_string())),
            None => Ok(QueueStats::default()),
        }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn worker_loop(mut executor: Box<dyn CommandExecutor>, rx: Receiver<Job>) -> QueueStats {
    let mut stats = QueueStats::default();

    // Ends once the queue's sender is dropped and the channel is empty
    for job in rx.iter() {
        if job(executor.as_mut()) {
            stats.completed += 1;
        } else {
            stats.failed += 1;
        }
    }

    tracing::debug!(
        completed = stats.completed,
        failed = stats.failed,
        "write queue drained"
    );
    stats
}
