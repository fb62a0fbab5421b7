// src/exec/executor_loop.rs

//! Foreground loop that runs queued jobs one at a time.

use std::panic::{self, AssertUnwindSafe};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::backend::Job;

tokio::task_local! {
    static FOREGROUND: ();
}

/// Spawn the foreground loop on `handle`.
///
/// The returned sender is the foreground queue. Jobs are executed in the
/// order they were sent, strictly one after another, inside a single Tokio
/// task. The loop exits once every sender has been dropped and the queue is
/// drained.
///
/// A job that panics is logged and discarded; the loop keeps serving the
/// queue.
pub fn spawn_foreground_loop(handle: &Handle) -> mpsc::UnboundedSender<Job> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    handle.spawn(FOREGROUND.scope((), async move {
        info!("foreground loop started");

        let mut executed: u64 = 0;
        while let Some(job) = rx.recv().await {
            run_job(job, executed);
            executed += 1;
        }

        info!(executed, "foreground loop finished (channel closed)");
    }));

    tx
}

fn run_job(job: Job, seq: u64) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        error!(
            seq,
            panic = %panic_message(payload.as_ref()),
            "foreground job panicked; continuing with next job"
        );
    } else {
        debug!(seq, "foreground job done");
    }
}

/// Whether the caller is currently running inside a foreground loop spawned
/// by [`spawn_foreground_loop`].
pub fn on_foreground() -> bool {
    FOREGROUND.try_with(|_| ()).is_ok()
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
