// src/tasks/simple.rs

use std::fmt;

use crate::task::{ProgressSink, Task};

/// Runs an arbitrary computation as a task: work in the background, result
/// on the foreground. No progress, no cancellation.
///
/// ```
/// use netdiag::tasks::SimpleTask;
///
/// let task = SimpleTask::new("hostname", || {
///     std::env::var("HOSTNAME").map_err(|e| e.to_string())
/// });
/// # drop(task);
/// ```
pub struct SimpleTask<F> {
    name: String,
    action: F,
}

impl<F> SimpleTask<F> {
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<F, T, E> Task for SimpleTask<F>
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: fmt::Debug + Send + 'static,
    E: fmt::Display + fmt::Debug + Send + 'static,
{
    type Output = T;
    type Error = E;

    fn run(&self, _progress: &ProgressSink) -> Result<T, E> {
        (self.action)()
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
