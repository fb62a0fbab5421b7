// src/engine/mod.rs

//! Dispatch engine.
//!
//! - [`config`] holds the [`DiagnosisConfig`] value (debug flag, logger,
//!   executor) owned by whoever builds a dispatcher.
//! - [`logger`] defines the two-level [`Logger`] sink.
//! - [`dispatcher`] implements [`Diagnosis::execute`], the single path from a
//!   task to its listener.
//! - [`chain`] builds the sequential, abort-aware [`TaskChain`] on top.

pub mod chain;
pub mod config;
pub mod dispatcher;
pub mod logger;

pub use chain::{ChainPhase, ChainStep, TaskChain};
pub use config::DiagnosisConfig;
pub use dispatcher::Diagnosis;
pub use logger::{Logger, NoopLogger, TracingLogger};
