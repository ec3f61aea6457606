// src/pool.rs

use crate::error::{AnalysisFailure, Error, Result};
use crossbeam::channel::{self, Receiver};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Fixed-size pool of analysis workers. Dropping the pool cancels every task
/// that has not started yet and shuts the worker threads down.
///
/// A task that is already running cannot be interrupted: it keeps its worker
/// thread busy until it returns, even after the coordinator has given up on
/// the run and dropped the pool.
pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
    cancelled: Arc<AtomicBool>,
}

/// Result of a submitted task, collected with [`TaskHandle::wait`]
pub struct TaskHandle<T> {
    receiver: Receiver<std::result::Result<T, AnalysisFailure>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("regress-worker-{i}"))
            .build()?;
        debug!(workers = size, "started worker pool");
        Ok(Self {
            pool,
            size,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queues `task` on the pool. A panic inside the task is caught and
    /// turned into an [`AnalysisFailure`] for `entry_name`.
    pub fn submit<T, F>(&self, entry_name: &str, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> std::result::Result<T, AnalysisFailure> + Send + 'static,
    {
        let (sender, receiver) = channel::bounded(1);
        let cancelled = Arc::clone(&self.cancelled);
        let entry_name = entry_name.to_string();

        self.pool.spawn(move || {
            if cancelled.load(Ordering::Acquire) {
                return;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
                Err(AnalysisFailure {
                    entry_name,
                    message: panic_message(payload.as_ref()),
                    category: "panic".to_string(),
                    trace: Backtrace::force_capture().to_string(),
                })
            });
            // The coordinator may already have stopped listening
            let _ = sender.send(outcome);
        });

        TaskHandle { receiver }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        debug!("shutting down worker pool");
    }
}

impl<T> TaskHandle<T> {
    /// Blocks until the task has finished.
    pub fn wait(self) -> Result<T> {
        match self.receiver.recv() {
            Ok(outcome) => outcome.map_err(Error::from),
            Err(_) => Err(Error::PoolClosed),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
