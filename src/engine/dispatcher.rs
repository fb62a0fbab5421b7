// src/engine/dispatcher.rs

//! The dispatch pipeline: run a task on the background context and deliver
//! its lifecycle to a listener on the foreground context.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::config::DiagnosisConfig;
use crate::exec::executor_loop::panic_message;
use crate::task::{Callbacks, ProgressSink, Task, TaskError, TaskHandle, TaskListener};

/// Entry point for running tasks.
///
/// Cheap to clone; clones share the same [`DiagnosisConfig`].
#[derive(Debug, Clone)]
pub struct Diagnosis {
    config: DiagnosisConfig,
}

impl Diagnosis {
    pub fn new(config: DiagnosisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    /// Dispatch `task` and report its lifecycle to `listener`.
    ///
    /// Returns immediately. For every call, on the foreground context:
    /// - `on_started` fires first,
    /// - `on_progress` fires for each value the task reports,
    /// - exactly one of `on_finished` / `on_error` fires last.
    ///
    /// Errors and panics raised by the task body are converted into
    /// `on_error`; nothing escapes into the executor. Pass `()` as the
    /// listener to run a task for its side effects only.
    pub fn execute<T, L>(&self, task: T, listener: L) -> TaskHandle<T>
    where
        T: Task,
        L: TaskListener<T::Output, T::Error>,
    {
        self.execute_shared(Arc::new(task), listener)
    }

    /// Like [`execute`](Self::execute) for a task the caller already shares.
    pub fn execute_shared<T, L>(&self, task: Arc<T>, listener: L) -> TaskHandle<T>
    where
        T: Task,
        L: TaskListener<T::Output, T::Error>,
    {
        let name = task.name();
        self.config.log_debug(format_args!("Enqueued task {name}"));

        // Snapshot the config: later changes must not affect this dispatch.
        let config = self.config.clone();
        let listener = Arc::new(Mutex::new(listener));
        let body = Arc::clone(&task);

        self.config.executor().run_background(Box::new(move || {
            run_dispatched(config, body, name, listener);
        }));

        TaskHandle::new(task)
    }

    /// Shorthand for a listener that only cares about the result.
    pub fn execute_then<T>(
        &self,
        task: T,
        on_finished: impl FnOnce(T::Output) + Send + 'static,
    ) -> TaskHandle<T>
    where
        T: Task,
    {
        self.execute(task, Callbacks::new().on_finished(on_finished))
    }
}

/// Background half of a dispatch.
fn run_dispatched<T, L>(
    config: DiagnosisConfig,
    task: Arc<T>,
    name: String,
    listener: Arc<Mutex<L>>,
) where
    T: Task,
    L: TaskListener<T::Output, T::Error>,
{
    config.log_debug(format_args!("Started task {name}"));
    let executor = Arc::clone(config.executor());

    {
        let listener = Arc::clone(&listener);
        executor.run_foreground(Box::new(move || lock(&listener).on_started()));
    }

    let sink = {
        let listener = Arc::clone(&listener);
        let executor = Arc::clone(&executor);
        ProgressSink::attached(move |progress| {
            let listener = Arc::clone(&listener);
            executor.run_foreground(Box::new(move || lock(&listener).on_progress(progress)));
        })
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run(&sink)));
    drop(sink);

    let error = match outcome {
        Ok(Ok(result)) => {
            config.log_debug(format_args!("Task {name} returned as: {result:?}"));
            executor.run_foreground(Box::new(move || lock(&listener).on_finished(result)));
            return;
        }
        Ok(Err(error)) => {
            config.log_warn(format_args!("Task {name} throws an exception: {error}"));
            TaskError::Failed(error)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            config.log_warn(format_args!("Task {name} panicked: {message}"));
            TaskError::Panicked(message)
        }
    };

    executor.run_foreground(Box::new(move || lock(&listener).on_error(error)));
}

/// Listener callbacks only ever run on the serialized foreground context, so
/// the lock is uncontended; a poisoned lock just means an earlier callback
/// panicked.
fn lock<L>(listener: &Mutex<L>) -> MutexGuard<'_, L> {
    listener.lock().unwrap_or_else(PoisonError::into_inner)
}
