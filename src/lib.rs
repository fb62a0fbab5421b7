// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod runner;
pub mod task;
pub mod tasks;
pub mod types;

pub use engine::{ChainPhase, ChainStep, Diagnosis, DiagnosisConfig, TaskChain};
pub use errors::{NetdiagError, CheckError};
pub use exec::{Executor, TokioExecutor};
pub use task::{Callbacks, ProgressSink, Task, TaskError, TaskHandle, TaskListener};

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path};
use crate::runner::{ChainSink, ParallelSink, flush_foreground, submit_checks};
use crate::types::RunMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then CLI overrides, then validation)
/// - the dispatcher on the current tokio runtime
/// - the checks, run in parallel or as a chain
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    run_with_config(&args, cfg).await
}

/// [`run`] with an already resolved config.
pub async fn run_with_config(args: &CliArgs, cfg: ConfigFile) -> Result<()> {
    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let diagnosis =
        Diagnosis::new(DiagnosisConfig::from_current_runtime()?.with_debug(cfg.config.debug));

    let failures = match cfg.config.mode {
        RunMode::Parallel => run_parallel(&diagnosis, &cfg).await?,
        RunMode::Chain => run_chain(&diagnosis, &cfg).await?,
    };

    if failures > 0 {
        bail!("{failures} check(s) failed");
    }
    Ok(())
}

/// Load the config file (explicit path, else `netdiag.toml` if present, else
/// defaults), apply CLI overrides and validate the result.
///
/// `--debug` ends up in `cfg.config.debug`, so that flag alone tells whether
/// dispatcher debug lines are wanted.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_config_path();
            if path.exists() {
                load_from_path(&path)?
            } else {
                debug!("no config file found; using defaults");
                RawConfigFile::default()
            }
        }
    };

    if args.debug {
        raw.config.debug = true;
    }
    if let Some(mode) = args.mode {
        raw.config.mode = mode;
    }
    raw.ping.targets.extend(args.ping.iter().cloned());

    Ok(ConfigFile::try_from(raw)?)
}

/// Execute every check at once and wait for all terminal callbacks.
/// Returns the number of failed checks.
async fn run_parallel(diagnosis: &Diagnosis, cfg: &ConfigFile) -> Result<usize> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<bool>();
    let mut sink = ParallelSink::new(diagnosis.clone(), done_tx);
    let submitted = submit_checks(cfg, &mut sink)?;
    drop(sink);
    info!(checks = submitted, "running checks in parallel");

    let mut failures = 0;
    for _ in 0..submitted {
        match done_rx.recv().await {
            Some(true) => {}
            Some(false) => failures += 1,
            None => break,
        }
    }
    Ok(failures)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainEnd {
    Finished,
    Aborted,
}

/// Run the checks one after another. With `abort_on_error`, the first error
/// skips the rest. Returns the number of failed checks.
async fn run_chain(diagnosis: &Diagnosis, cfg: &ConfigFile) -> Result<usize> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<bool>();
    let (end_tx, mut end_rx) = mpsc::unbounded_channel::<ChainEnd>();

    let chain = TaskChain::new(diagnosis.clone());
    {
        let tx = end_tx.clone();
        chain.set_finish_callback(move || {
            let _ = tx.send(ChainEnd::Finished);
        });
    }
    chain.set_abort_callback(move || {
        let _ = end_tx.send(ChainEnd::Aborted);
    });

    let mut sink = ChainSink::new(chain.clone(), done_tx, cfg.config.abort_on_error);
    let submitted = submit_checks(cfg, &mut sink)?;
    drop(sink);
    info!(checks = submitted, "running checks as a chain");

    chain.start()?;
    let end = end_rx.recv().await;

    // The abort hook fires inside a step's callback; let that callback finish
    // printing before counting.
    flush_foreground(diagnosis.config().executor().as_ref()).await;

    let mut failures = 0;
    let mut reported = 0;
    while let Ok(ok) = done_rx.try_recv() {
        reported += 1;
        if !ok {
            failures += 1;
        }
    }

    if end == Some(ChainEnd::Aborted) {
        let skipped = submitted.saturating_sub(reported);
        println!("chain aborted; {skipped} check(s) skipped");
    }
    Ok(failures)
}

/// Simple dry-run output: print the resolved config and the check list.
fn print_dry_run(cfg: &ConfigFile) {
    println!("netdiag dry-run");
    println!("  config.mode = {:?}", cfg.config.mode);
    println!("  config.debug = {}", cfg.config.debug);
    println!("  config.abort_on_error = {}", cfg.config.abort_on_error);
    println!();

    println!("checks:");
    if cfg.network_info.enabled {
        println!("  - network");
        println!("      sysfs_root: {}", cfg.network_info.sysfs_root.display());
    }
    if cfg.ip.enabled {
        println!("  - ip");
        println!("      servers: {:?}", cfg.ip.servers);
        println!("      timeout_secs: {}", cfg.ip.timeout_secs);
    }
    if cfg.dns.enabled {
        println!("  - dns");
        println!("      endpoint: {}", cfg.dns.endpoint);
        println!("      local_source: {:?}", cfg.dns.local_source);
        if cfg.dns.local_source == types::LocalDnsKind::ResolvConf {
            println!("      resolv_conf: {}", cfg.dns.resolv_conf.display());
        }
    }
    for target in &cfg.ping.targets {
        println!("  - ping {target}");
        println!("      count: {}", cfg.ping.count);
        println!("      program: {}", cfg.ping.program);
    }

    debug!("dry-run complete (no execution)");
}
