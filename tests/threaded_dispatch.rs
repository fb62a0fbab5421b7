// tests/threaded_dispatch.rs

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use netdiag::engine::{Diagnosis, DiagnosisConfig};
use netdiag::task::{TaskError, TaskListener};
use netdiag::tasks::SimpleTask;
use netdiag_test_utils::fake_executor::ThreadExecutor;
use netdiag_test_utils::fake_task::FakeTask;
use netdiag_test_utils::recorder::{Event, EventLog};
use netdiag_test_utils::{TEST_TIMEOUT, init_tracing, with_timeout};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn Error>>;

/// Task body that waits until `peers` bodies are running at the same time.
/// Returns whether that happened before the deadline.
fn rendezvous(
    name: &str,
    arrived: Arc<AtomicUsize>,
    peers: usize,
) -> SimpleTask<impl Fn() -> Result<bool, String> + Send + Sync + 'static> {
    SimpleTask::new(name, move || {
        arrived.fetch_add(1, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if arrived.load(Ordering::SeqCst) >= peers {
                return Ok(true);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(false)
    })
}

/// Listener that flags overlapping callbacks and reports terminal events.
struct OverlapWatcher {
    active: Arc<AtomicUsize>,
    overlaps: Arc<AtomicUsize>,
    done: mpsc::UnboundedSender<String>,
}

impl OverlapWatcher {
    fn enter(&self) {
        if self.active.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(1));
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<R, E> TaskListener<R, E> for OverlapWatcher
where
    R: std::fmt::Debug + 'static,
    E: std::fmt::Display + 'static,
{
    fn on_started(&mut self) {
        self.enter();
    }

    fn on_progress(&mut self, _progress: u32) {
        self.enter();
    }

    fn on_finished(&mut self, result: R) {
        self.enter();
        let _ = self.done.send(format!("{result:?}"));
    }

    fn on_error(&mut self, error: TaskError<E>) {
        self.enter();
        let _ = self.done.send(error.to_string());
    }
}

#[test]
fn thread_executor_delivers_on_the_foreground_thread() -> TestResult {
    init_tracing();
    let exec = ThreadExecutor::new();
    let foreground = exec.foreground_thread();
    let diagnosis = Diagnosis::new(DiagnosisConfig::new(exec));
    let log = EventLog::new();

    for i in 0..12u32 {
        let label = format!("t{i}");
        let task = if i % 4 == 0 {
            FakeTask::err(&label, "failed")
        } else {
            FakeTask::ok(&label, i)
        };
        let task = task
            .with_progress(&[25, 50, 75])
            .with_delay(Duration::from_millis(5));
        diagnosis.execute(task, log.recorder(label));
    }

    assert!(log.wait_for_terminals(12, TEST_TIMEOUT));
    let records = log.records();
    assert!(records.iter().all(|r| r.thread == foreground));
    assert!(records.iter().all(|r| r.on_foreground));

    for i in 0..12u32 {
        let events = log.events_for(&format!("t{i}"));
        assert_eq!(events.len(), 5, "t{i}: {events:?}");
        assert!(events[4].is_terminal());
    }
    Ok(())
}

#[test]
fn thread_executor_runs_bodies_in_parallel() -> TestResult {
    init_tracing();
    let diagnosis = Diagnosis::new(DiagnosisConfig::new(ThreadExecutor::new()));
    let log = EventLog::new();
    let arrived = Arc::new(AtomicUsize::new(0));

    for name in ["left", "right"] {
        diagnosis.execute(rendezvous(name, Arc::clone(&arrived), 2), log.recorder(name));
    }

    assert!(log.wait_for_terminals(2, TEST_TIMEOUT));
    for name in ["left", "right"] {
        assert_eq!(
            log.events_for(name).last(),
            Some(&Event::Finished(name.into(), "true".into()))
        );
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tokio_executor_runs_callbacks_inside_the_foreground_loop() -> TestResult {
    init_tracing();
    let diagnosis = Diagnosis::new(DiagnosisConfig::from_current_runtime()?);
    let log = EventLog::new();

    for i in 0..8u32 {
        let label = format!("t{i}");
        let task = FakeTask::ok(&label, i).with_progress(&[10, 90]);
        diagnosis.execute(task, log.recorder(label));
    }

    let waiter = log.clone();
    let done = tokio::task::spawn_blocking(move || waiter.wait_for_terminals(8, TEST_TIMEOUT)).await?;
    assert!(done);
    assert!(log.records().iter().all(|r| r.on_foreground));
    assert!(!netdiag::exec::on_foreground());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tokio_foreground_callbacks_never_overlap() -> TestResult {
    init_tracing();
    let diagnosis = Diagnosis::new(DiagnosisConfig::from_current_runtime()?);
    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();

    for i in 0..16u32 {
        let label = format!("t{i}");
        let task = if i % 5 == 0 {
            FakeTask::panics(&label, "bad")
        } else {
            FakeTask::ok(&label, i)
        };
        let watcher = OverlapWatcher {
            active: Arc::clone(&active),
            overlaps: Arc::clone(&overlaps),
            done: tx.clone(),
        };
        diagnosis.execute(task.with_progress(&[1, 2, 3]), watcher);
    }
    drop(tx);

    let mut terminals = 0;
    with_timeout(async {
        while rx.recv().await.is_some() {
            terminals += 1;
        }
    })
    .await;

    assert_eq!(terminals, 16);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tokio_executor_runs_bodies_in_parallel() -> TestResult {
    init_tracing();
    let diagnosis = Diagnosis::new(DiagnosisConfig::from_current_runtime()?);
    let arrived = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel::<bool>();

    for name in ["a", "b", "c"] {
        let tx = tx.clone();
        diagnosis.execute_then(rendezvous(name, Arc::clone(&arrived), 3), move |met| {
            let _ = tx.send(met);
        });
    }
    drop(tx);

    let results = with_timeout(async {
        let mut results = Vec::new();
        while let Some(met) = rx.recv().await {
            results.push(met);
        }
        results
    })
    .await;

    assert_eq!(results, vec![true, true, true]);
    Ok(())
}
