// src/errors.rs

//! Crate-wide error types.
//!
//! - [`NetdiagError`] covers configuration, chain misuse and executor setup.
//! - [`CheckError`] is what the bundled diagnosis tasks raise out of
//!   `Task::run`; it ends up in `TaskError::Failed`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetdiagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("task chain has already been started")]
    ChainAlreadyStarted,

    #[error("cannot add a task to a chain that has already been started")]
    ChainSealed,

    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by the bundled check tasks.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, NetdiagError>;
