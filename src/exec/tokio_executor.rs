// src/exec/tokio_executor.rs

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::warn;

use super::backend::{Executor, Job};
use super::executor_loop::spawn_foreground_loop;
use crate::errors::{NetdiagError, Result};

/// Default executor backed by a Tokio runtime.
///
/// - background jobs go to the runtime's blocking pool (`spawn_blocking`),
///   one submission per job, so long-running task bodies never wait on each
///   other;
/// - foreground jobs go through a single queue drained by one Tokio task
///   (see [`spawn_foreground_loop`]).
///
/// Cloning shares the same foreground queue.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
    foreground: mpsc::UnboundedSender<Job>,
}

impl TokioExecutor {
    /// Create an executor on the given runtime. The foreground loop is
    /// spawned immediately.
    pub fn new(handle: Handle) -> Self {
        let foreground = spawn_foreground_loop(&handle);
        Self { handle, foreground }
    }

    /// Create an executor on the runtime the caller is running in.
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| NetdiagError::NoRuntime(e.to_string()))?;
        Ok(Self::new(handle))
    }
}

impl Executor for TokioExecutor {
    fn run_background(&self, job: Job) {
        // Detached: the dispatcher reports outcomes through the foreground.
        drop(self.handle.spawn_blocking(job));
    }

    fn run_foreground(&self, job: Job) {
        if self.foreground.send(job).is_err() {
            warn!("foreground loop is gone (runtime shut down?); dropping job");
        }
    }
}
