//! Test support for `netdiag`: fake executors, a recording listener,
//! scripted tasks and config builders.

pub mod builders;
pub mod fake_executor;
pub mod fake_task;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use netdiag::engine::{Diagnosis, DiagnosisConfig};
use tracing_subscriber::{fmt, EnvFilter};

use crate::fake_executor::QueueExecutor;

/// Upper bound for any single async test step.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Initialise tracing for tests, once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `--nocapture`). `RUST_LOG` overrides the default filter, which
/// keeps the dispatcher's own `netdiag` target at `debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,netdiag=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// A dispatcher on a fresh [`QueueExecutor`], plus a handle to drive it.
///
/// Nothing runs until the test calls `run_until_idle` (or a single-step
/// helper) on the returned executor.
pub fn queue_diagnosis(debug: bool) -> (QueueExecutor, Diagnosis) {
    init_tracing();
    let exec = QueueExecutor::new();
    let diagnosis = Diagnosis::new(DiagnosisConfig::new(exec.clone()).with_debug(debug));
    (exec, diagnosis)
}

/// Await `f`, failing the test after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step timed out after {TEST_TIMEOUT:?}"))
}
