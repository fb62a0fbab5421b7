use std::cell::Cell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use netdiag::exec::{Executor, Job};
use tokio::sync::mpsc;

thread_local! {
    static IN_FOREGROUND: Cell<bool> = const { Cell::new(false) };
}

/// Whether the calling thread is currently running a foreground job of a
/// [`QueueExecutor`] or [`ThreadExecutor`].
pub fn in_fake_foreground() -> bool {
    IN_FOREGROUND.with(Cell::get)
}

fn run_as_foreground(job: Job) {
    IN_FOREGROUND.with(|f| f.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(job));
    IN_FOREGROUND.with(|f| f.set(false));
    if outcome.is_err() {
        tracing::error!("fake executor: foreground job panicked");
    }
}

#[derive(Default)]
struct Queues {
    background: VecDeque<Job>,
    foreground: VecDeque<Job>,
}

/// A deterministic, single-threaded executor.
///
/// Nothing runs until the test drives it: jobs are queued and executed by
/// [`run_until_idle`](Self::run_until_idle) (or the single-step helpers) on
/// the test's own thread. Clones share the same queues, so a test can hand
/// one clone to the dispatcher and keep another to drive it.
#[derive(Clone, Default)]
pub struct QueueExecutor {
    queues: Arc<Mutex<Queues>>,
}

impl QueueExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_background(&self) -> usize {
        self.queues.lock().unwrap().background.len()
    }

    pub fn pending_foreground(&self) -> usize {
        self.queues.lock().unwrap().foreground.len()
    }

    /// Run the oldest background job, if any.
    pub fn run_background_once(&self) -> bool {
        let job = self.queues.lock().unwrap().background.pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run the oldest foreground job, if any.
    pub fn run_foreground_once(&self) -> bool {
        let job = self.queues.lock().unwrap().foreground.pop_front();
        match job {
            Some(job) => {
                run_as_foreground(job);
                true
            }
            None => false,
        }
    }

    /// Run every queued foreground job, including ones queued meanwhile.
    pub fn drain_foreground(&self) -> usize {
        let mut ran = 0;
        while self.run_foreground_once() {
            ran += 1;
        }
        ran
    }

    /// Run jobs until both queues are empty, foreground first. Returns the
    /// number of jobs executed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            if self.run_foreground_once() || self.run_background_once() {
                ran += 1;
            } else {
                return ran;
            }
        }
    }
}

impl Executor for QueueExecutor {
    fn run_background(&self, job: Job) {
        self.queues.lock().unwrap().background.push_back(job);
    }

    fn run_foreground(&self, job: Job) {
        self.queues.lock().unwrap().foreground.push_back(job);
    }
}

/// A real multi-threaded executor without Tokio.
///
/// Each background job gets its own OS thread; foreground jobs are run in
/// order on one dedicated thread.
#[derive(Clone)]
pub struct ThreadExecutor {
    foreground: mpsc::UnboundedSender<Job>,
    foreground_thread: ThreadId,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let handle = thread::Builder::new()
            .name("fake-foreground".to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    run_as_foreground(job);
                }
            })
            .expect("failed to spawn foreground thread");

        Self {
            foreground: tx,
            foreground_thread: handle.thread().id(),
        }
    }

    pub fn foreground_thread(&self) -> ThreadId {
        self.foreground_thread
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ThreadExecutor {
    fn run_background(&self, job: Job) {
        thread::spawn(job);
    }

    fn run_foreground(&self, job: Job) {
        let _ = self.foreground.send(job);
    }
}
