use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use netdiag::task::{TaskError, TaskListener};

use crate::fake_executor::in_fake_foreground;

/// One listener callback as seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Progress(String, u32),
    /// Result rendered with `{:?}`.
    Finished(String, String),
    /// Error rendered with `{}`.
    Error(String, String),
}

impl Event {
    pub fn label(&self) -> &str {
        match self {
            Event::Started(l) | Event::Progress(l, _) | Event::Finished(l, _) | Event::Error(l, _) => l,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Finished(..) | Event::Error(..))
    }
}

/// Where and when a callback ran.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub event: Event,
    pub thread: ThreadId,
    /// True if the callback ran inside a fake foreground or a Tokio foreground
    /// loop.
    pub on_foreground: bool,
}

/// Shared, append-only log of listener callbacks.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<(Mutex<Vec<Recorded>>, Condvar)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that appends to this log under `label`.
    pub fn recorder(&self, label: impl Into<String>) -> Recorder {
        Recorder {
            label: label.into(),
            log: self.clone(),
        }
    }

    pub fn push(&self, event: Event) {
        let (lock, cvar) = &*self.inner;
        lock.lock().unwrap().push(Recorded {
            event,
            thread: thread::current().id(),
            on_foreground: in_fake_foreground() || netdiag::exec::on_foreground(),
        });
        cvar.notify_all();
    }

    pub fn records(&self) -> Vec<Recorded> {
        self.inner.0.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    /// Events recorded under `label`, in order.
    pub fn events_for(&self, label: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.label() == label)
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.events().iter().filter(|e| e.is_terminal()).count()
    }

    /// Block until `done` holds for the recorded events or `timeout` passes.
    /// Returns whether `done` held.
    pub fn wait_until(&self, timeout: Duration, mut done: impl FnMut(&[Recorded]) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.inner;
        let mut guard = lock.lock().unwrap();
        loop {
            if done(&guard) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = cvar.wait_timeout(guard, deadline - now).unwrap().0;
        }
    }

    /// Block until at least `n` terminal callbacks were recorded.
    pub fn wait_for_terminals(&self, n: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, |records| {
            records.iter().filter(|r| r.event.is_terminal()).count() >= n
        })
    }
}

/// Listener that appends every callback to an [`EventLog`].
pub struct Recorder {
    label: String,
    log: EventLog,
}

impl<R, E> TaskListener<R, E> for Recorder
where
    R: fmt::Debug + 'static,
    E: fmt::Display + 'static,
{
    fn on_started(&mut self) {
        self.log.push(Event::Started(self.label.clone()));
    }

    fn on_progress(&mut self, progress: u32) {
        self.log.push(Event::Progress(self.label.clone(), progress));
    }

    fn on_finished(&mut self, result: R) {
        self.log
            .push(Event::Finished(self.label.clone(), format!("{result:?}")));
    }

    fn on_error(&mut self, error: TaskError<E>) {
        self.log.push(Event::Error(self.label.clone(), error.to_string()));
    }
}
