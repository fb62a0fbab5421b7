// src/config/mod.rs

//! Configuration for the `netdiag` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate check settings (`validate.rs`).
//!
//! Library users configure the dispatcher with
//! [`DiagnosisConfig`](crate::engine::DiagnosisConfig) instead.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, DnsSection, IpSection, NetworkInfoSection, PingSection,
    RawConfigFile,
};
pub use validate::validate_config;
