// src/task/listener.rs

//! Listener contract for a single dispatch.

use super::TaskError;

/// Receives the lifecycle events of one dispatched task.
///
/// Every method runs on the foreground context. For a single dispatch the
/// order is: `on_started`, then any number of `on_progress`, then exactly one
/// of `on_finished` / `on_error`.
///
/// All methods default to no-ops, and `()` implements the trait, so a task
/// can be dispatched purely for its side effects.
pub trait TaskListener<R, E>: Send + 'static {
    /// The task body is about to run. Always fired, whether or not the task
    /// reports progress; this is not the same as a `0` progress report.
    fn on_started(&mut self) {}

    fn on_progress(&mut self, _progress: u32) {}

    fn on_finished(&mut self, _result: R) {}

    fn on_error(&mut self, _error: TaskError<E>) {}
}

impl<R, E> TaskListener<R, E> for () {}

type StartedFn = Box<dyn FnOnce() + Send>;
type ProgressFn = Box<dyn FnMut(u32) + Send>;
type FinishedFn<R> = Box<dyn FnOnce(R) + Send>;
type ErrorFn<E> = Box<dyn FnOnce(TaskError<E>) + Send>;

/// Closure-based [`TaskListener`] with four independent optional slots.
///
/// ```
/// use netdiag::task::Callbacks;
///
/// let callbacks: Callbacks<u32, String> = Callbacks::new()
///     .on_progress(|p| println!("{p}%"))
///     .on_finished(|r| println!("got {r}"));
/// # drop(callbacks);
/// ```
pub struct Callbacks<R, E> {
    started: Option<StartedFn>,
    progress: Option<ProgressFn>,
    finished: Option<FinishedFn<R>>,
    error: Option<ErrorFn<E>>,
}

impl<R, E> Callbacks<R, E> {
    pub fn new() -> Self {
        Self {
            started: None,
            progress: None,
            finished: None,
            error: None,
        }
    }

    pub fn on_started(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.started = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(u32) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn on_finished(mut self, f: impl FnOnce(R) + Send + 'static) -> Self {
        self.finished = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(TaskError<E>) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl<R, E> Default for Callbacks<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static, E: 'static> TaskListener<R, E> for Callbacks<R, E> {
    fn on_started(&mut self) {
        if let Some(f) = self.started.take() {
            f();
        }
    }

    fn on_progress(&mut self, progress: u32) {
        if let Some(f) = self.progress.as_mut() {
            f(progress);
        }
    }

    fn on_finished(&mut self, result: R) {
        if let Some(f) = self.finished.take() {
            f(result);
        }
    }

    fn on_error(&mut self, error: TaskError<E>) {
        if let Some(f) = self.error.take() {
            f(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn absent_slots_are_no_ops() {
        let mut callbacks: Callbacks<u32, String> = Callbacks::new();
        TaskListener::on_started(&mut callbacks);
        TaskListener::on_progress(&mut callbacks, 10);
        TaskListener::on_finished(&mut callbacks, 1);
        TaskListener::on_error(&mut callbacks, TaskError::Failed("boom".to_string()));
    }

    #[test]
    fn present_slots_receive_values() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks: Callbacks<u32, String> = Callbacks::new()
            .on_started({
                let log = Arc::clone(&log);
                move || log.lock().unwrap().push("started".to_string())
            })
            .on_progress({
                let log = Arc::clone(&log);
                move |p| log.lock().unwrap().push(format!("progress {p}"))
            })
            .on_finished({
                let log = Arc::clone(&log);
                move |r| log.lock().unwrap().push(format!("finished {r}"))
            });

        TaskListener::on_started(&mut callbacks);
        TaskListener::on_progress(&mut callbacks, 20);
        TaskListener::on_progress(&mut callbacks, 80);
        TaskListener::on_finished(&mut callbacks, 7);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["started", "progress 20", "progress 80", "finished 7"]
        );
    }
}
