// src/runner.rs

//! Turns a [`ConfigFile`] into dispatched checks.
//!
//! The same check list feeds both run modes through [`CheckSink`]:
//! [`ParallelSink`] executes every check right away, [`ChainSink`] appends
//! them to a [`TaskChain`].

use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::config::ConfigFile;
use crate::engine::{ChainStep, Diagnosis, TaskChain};
use crate::errors::Result;
use crate::exec::Executor;
use crate::task::{Callbacks, Task};
use crate::tasks::{DnsTask, IpTask, LocalDnsSource, NetworkInfoTask, PingTask};
use crate::types::LocalDnsKind;

/// Something checks can be handed to.
pub trait CheckSink {
    fn submit<T>(&mut self, label: String, task: T) -> Result<()>
    where
        T: Task,
        T::Output: fmt::Display;
}

/// Submit every check enabled in `cfg`, in a fixed order. Returns how many
/// were submitted.
pub fn submit_checks(cfg: &ConfigFile, sink: &mut impl CheckSink) -> Result<usize> {
    let mut submitted = 0;

    if cfg.network_info.enabled {
        let task = NetworkInfoTask::with_sysfs_root(&cfg.network_info.sysfs_root);
        sink.submit("network".to_string(), task)?;
        submitted += 1;
    }

    if cfg.ip.enabled {
        let task = IpTask::with_servers(cfg.ip.servers.iter().cloned())
            .with_timeout(Duration::from_secs(cfg.ip.timeout_secs));
        sink.submit("ip".to_string(), task)?;
        submitted += 1;
    }

    if cfg.dns.enabled {
        let source = match cfg.dns.local_source {
            LocalDnsKind::Getprop => LocalDnsSource::GetProp,
            LocalDnsKind::ResolvConf => LocalDnsSource::ResolvConf(cfg.dns.resolv_conf.clone()),
        };
        let task = DnsTask::new()
            .with_endpoint(cfg.dns.endpoint.clone())
            .with_local_source(source)
            .with_timeout(Duration::from_secs(cfg.dns.timeout_secs));
        sink.submit("dns".to_string(), task)?;
        submitted += 1;
    }

    for target in &cfg.ping.targets {
        let task = PingTask::new(target.clone())
            .with_count(cfg.ping.count)
            .with_program(cfg.ping.program.clone());
        sink.submit(format!("ping {target}"), task)?;
        submitted += 1;
    }

    Ok(submitted)
}

/// Listener printing one line per check to stdout and reporting success on
/// `done` once the line is out.
fn report_listener<R, E>(label: String, done: mpsc::UnboundedSender<bool>) -> Callbacks<R, E>
where
    R: fmt::Display + 'static,
    E: fmt::Display + 'static,
{
    let progress_label = label.clone();
    let error_label = label.clone();
    let error_done = done.clone();

    Callbacks::new()
        .on_progress(move |p| debug!(check = %progress_label, progress = p, "check progress"))
        .on_finished(move |result: R| {
            println!("{label}: {result}");
            let _ = done.send(true);
        })
        .on_error(move |err| {
            println!("{error_label}: error: {err}");
            let _ = error_done.send(false);
        })
}

/// Executes each check immediately on the dispatcher.
pub struct ParallelSink {
    diagnosis: Diagnosis,
    done: mpsc::UnboundedSender<bool>,
}

impl ParallelSink {
    pub fn new(diagnosis: Diagnosis, done: mpsc::UnboundedSender<bool>) -> Self {
        Self { diagnosis, done }
    }
}

impl CheckSink for ParallelSink {
    fn submit<T>(&mut self, label: String, task: T) -> Result<()>
    where
        T: Task,
        T::Output: fmt::Display,
    {
        let listener = report_listener(label, self.done.clone());
        self.diagnosis.execute(task, listener);
        Ok(())
    }
}

/// Appends each check to a chain.
pub struct ChainSink {
    chain: TaskChain,
    done: mpsc::UnboundedSender<bool>,
    abort_on_error: bool,
}

impl ChainSink {
    pub fn new(chain: TaskChain, done: mpsc::UnboundedSender<bool>, abort_on_error: bool) -> Self {
        Self {
            chain,
            done,
            abort_on_error,
        }
    }
}

impl CheckSink for ChainSink {
    fn submit<T>(&mut self, label: String, task: T) -> Result<()>
    where
        T: Task,
        T::Output: fmt::Display,
    {
        let abort_on_error = self.abort_on_error;
        let step = ChainStep::new(task)
            .with_listener(report_listener(label, self.done.clone()))
            .abort_on_error(move |_| abort_on_error);
        self.chain.add_step(step)
    }
}

/// Wait until every job queued on the foreground so far has run.
pub async fn flush_foreground(executor: &dyn Executor) {
    let (tx, rx) = oneshot::channel();
    executor.run_foreground(Box::new(move || {
        let _ = tx.send(());
    }));
    let _ = rx.await;
}
