// src/exec/backend.rs

//! Pluggable dual-context executor abstraction.
//!
//! The dispatcher talks to an [`Executor`] instead of spawning threads
//! itself. An executor offers two contexts:
//!
//! - **background**: where task bodies run. No ordering between two
//!   submissions; parallelism is expected.
//! - **foreground**: a single serialized context where all listener callbacks
//!   run, one job at a time, in submission order.
//!
//! Both operations are fire-and-forget. The default implementation is
//! [`TokioExecutor`](super::TokioExecutor); tests can supply their own (see
//! the `netdiag-test-utils` crate).

use std::sync::Arc;

/// A closure scheduled on one of the two contexts.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Trait abstracting where closures run.
///
/// Implementations decide what happens to a job that panics; the dispatcher
/// catches task-body panics itself and never relies on the executor for that.
pub trait Executor: Send + Sync {
    /// Schedule `job` off the calling context and return immediately.
    fn run_background(&self, job: Job);

    /// Schedule `job` on the serialized foreground context and return
    /// immediately. Jobs run in submission order, never concurrently.
    fn run_foreground(&self, job: Job);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn run_background(&self, job: Job) {
        (**self).run_background(job);
    }

    fn run_foreground(&self, job: Job) {
        (**self).run_foreground(job);
    }
}
