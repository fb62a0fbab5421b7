// src/task/mod.rs

//! Task abstraction.
//!
//! A [`Task`] is a blocking unit of work that produces a typed output or
//! raises a typed error. Tasks never deal with threads themselves: the
//! dispatcher (`engine::Diagnosis`) runs `Task::run` on the background
//! context and forwards every outcome to a [`TaskListener`] on the foreground
//! context.
//!
//! - [`listener`] holds the four-slot callback contract.
//! - [`progress`] holds the sink a task uses to report progress.

pub mod listener;
pub mod progress;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use listener::{Callbacks, TaskListener};
pub use progress::ProgressSink;

/// A unit of diagnosis work, e.g. a `ping` run.
///
/// Implementations own whatever parameters they need (target host, server
/// URL, ...) and are immutable once constructed, apart from handles kept for
/// [`Task::cancel`].
///
/// `Output` is the successful result. The framework only requires it to be
/// printable with `{:?}` for log lines; concrete result types usually also
/// implement `Display`.
pub trait Task: Send + Sync + 'static {
    type Output: fmt::Debug + Send + 'static;
    type Error: fmt::Display + fmt::Debug + Send + 'static;

    /// Run the task to completion. Called at most once per dispatch, on the
    /// background context; may block for an unbounded time.
    ///
    /// Failures are signalled by returning `Err`, never by a sentinel inside
    /// `Output`. The sink is only borrowed for the duration of the call.
    fn run(&self, progress: &ProgressSink) -> Result<Self::Output, Self::Error>;

    /// Ask an in-flight run to stop (e.g. kill a spawned process).
    ///
    /// Advisory only: nothing guarantees that `run` returns promptly, and the
    /// background context is never interrupted.
    fn cancel(&self) {}

    /// Label used in log lines.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Error delivered to [`TaskListener::on_error`].
#[derive(Error, Debug)]
pub enum TaskError<E> {
    /// The task returned `Err`.
    #[error("{0}")]
    Failed(E),

    /// The task body panicked; the payload message is kept when it is a string.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl<E> TaskError<E> {
    /// The error raised by the task, if it did not panic.
    pub fn failure(&self) -> Option<&E> {
        match self {
            TaskError::Failed(e) => Some(e),
            TaskError::Panicked(_) => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }
}

/// Handle returned by `Diagnosis::execute`.
///
/// Shares ownership of the dispatched task so the caller can request
/// cancellation while the body is running.
pub struct TaskHandle<T: Task> {
    task: Arc<T>,
}

impl<T: Task> TaskHandle<T> {
    pub(crate) fn new(task: Arc<T>) -> Self {
        Self { task }
    }

    /// Forward to [`Task::cancel`]. See there for the (weak) guarantees.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    pub fn task(&self) -> &T {
        &self.task
    }
}

impl<T: Task> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
        }
    }
}

impl<T: Task> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task", &self.task.name())
            .finish()
    }
}
