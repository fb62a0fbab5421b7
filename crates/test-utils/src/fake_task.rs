use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netdiag::task::{ProgressSink, Task};

/// Error raised by [`FakeTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeError(pub String);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FakeError {}

#[derive(Debug, Clone)]
enum Outcome {
    Ok(u32),
    Err(String),
    Panic(String),
}

/// Scripted task: reports the configured progress values, optionally
/// sleeps, then returns / fails / panics as configured.
#[derive(Debug)]
pub struct FakeTask {
    name: String,
    progress: Vec<u32>,
    delay: Option<Duration>,
    outcome: Outcome,
    run_log: Option<Arc<Mutex<Vec<String>>>>,
    runs: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl FakeTask {
    fn with_outcome(name: &str, outcome: Outcome) -> Self {
        Self {
            name: name.to_string(),
            progress: Vec::new(),
            delay: None,
            outcome,
            run_log: None,
            runs: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn ok(name: &str, value: u32) -> Self {
        Self::with_outcome(name, Outcome::Ok(value))
    }

    pub fn err(name: &str, message: &str) -> Self {
        Self::with_outcome(name, Outcome::Err(message.to_string()))
    }

    pub fn panics(name: &str, message: &str) -> Self {
        Self::with_outcome(name, Outcome::Panic(message.to_string()))
    }

    pub fn with_progress(mut self, values: &[u32]) -> Self {
        self.progress = values.to_vec();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append this task's name to `log` when its body starts.
    pub fn with_run_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.run_log = Some(log);
        self
    }

    /// Counter of how many times `run` was entered.
    pub fn runs(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }

    pub fn cancelled(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl Task for FakeTask {
    type Output = u32;
    type Error = FakeError;

    fn run(&self, progress: &ProgressSink) -> Result<u32, FakeError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.run_log {
            log.lock().unwrap().push(self.name.clone());
        }

        for p in &self.progress {
            progress.report(*p);
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        match &self.outcome {
            Outcome::Ok(v) => Ok(*v),
            Outcome::Err(msg) => Err(FakeError(msg.clone())),
            Outcome::Panic(msg) => panic!("{msg}"),
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
