// src/logging.rs

//! Logging setup for the `netdiag` binary (`tracing` + `tracing-subscriber`).
//!
//! The dispatcher's lifecycle lines ("Enqueued task ...", "Started task ...")
//! are `debug` events under the `netdiag` target, so turning on `debug` in
//! the config, or passing `--debug`, has to raise the subscriber level too.
//! See [`resolve_level`] for the exact rules.
//!
//! Everything goes to STDERR; check results own stdout.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "NETDIAG_LOG";

/// Pick the subscriber level.
///
/// 1. `--log-level` wins outright.
/// 2. Otherwise `NETDIAG_LOG` (e.g. "warn", "trace"), else `info`.
/// 3. With `debug` on (config file or `--debug`), a level quieter than
///    `debug` is raised to `debug`; `trace` stays `trace`.
pub fn resolve_level(cli_level: Option<LogLevel>, env_level: Option<&str>, debug: bool) -> Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }

    let base = env_level.and_then(parse_level_str).unwrap_or(Level::INFO);
    match base {
        Level::ERROR | Level::WARN | Level::INFO if debug => Level::DEBUG,
        other => other,
    }
}

/// Install the global subscriber at `level`.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(level: Level) -> Result<()> {
    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
