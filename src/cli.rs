// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::RunMode;

/// Command-line arguments for `netdiag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "netdiag",
    version,
    about = "Run network diagnosis checks (connectivity, IP, DNS, ping).",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `netdiag.toml` in the current working directory if it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Additional host to ping. May be repeated.
    #[arg(long = "ping", value_name = "HOST")]
    pub ping: Vec<String>,

    /// Run checks in parallel or as a sequential chain.
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<RunMode>,

    /// Print the dispatcher's debug lines (implies `--log-level debug`
    /// unless a level is given).
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NETDIAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate config, print the checks, but don't run them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_ping_targets_and_mode() {
        let args = CliArgs::try_parse_from([
            "netdiag", "--ping", "a.example", "--ping", "b.example", "--mode", "chain",
        ])
        .unwrap();
        assert_eq!(args.ping, vec!["a.example", "b.example"]);
        assert_eq!(args.mode, Some(RunMode::Chain));
        assert!(!args.debug);
    }
}
