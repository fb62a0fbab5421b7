// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::tasks::dns::{DEFAULT_ENDPOINT, DEFAULT_RESOLV_CONF};
use crate::tasks::ip::{SERVER_AKAMAI, SERVER_IPIFY};
use crate::tasks::network_info::DEFAULT_SYSFS_NET;
use crate::tasks::ping::{DEFAULT_COUNT, DEFAULT_PROGRAM};
use crate::types::{LocalDnsKind, RunMode};

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// debug = true
/// mode = "chain"
/// abort_on_error = true
///
/// [ping]
/// targets = ["example.com", "1.1.1.1"]
/// count = 4
///
/// [ip]
/// servers = ["http://whatismyip.akamai.com"]
///
/// [dns]
/// local_source = "resolv_conf"
///
/// [network_info]
/// enabled = false
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
    #[serde(default)]
    pub ping: PingSection,
    #[serde(default)]
    pub ip: IpSection,
    #[serde(default)]
    pub dns: DnsSection,
    #[serde(default)]
    pub network_info: NetworkInfoSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub ping: PingSection,
    pub ip: IpSection,
    pub dns: DnsSection,
    pub network_info: NetworkInfoSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            ping: raw.ping,
            ip: raw.ip,
            dns: raw.dns,
            network_info: raw.network_info,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Emit the dispatcher's debug lines (enqueued / started / returned).
    #[serde(default)]
    pub debug: bool,

    /// `"parallel"` (default) or `"chain"`.
    #[serde(default)]
    pub mode: RunMode,

    /// In chain mode, skip the remaining checks after the first error.
    #[serde(default)]
    pub abort_on_error: bool,
}

/// `[ping]` section. No targets means no ping check.
#[derive(Debug, Clone, Deserialize)]
pub struct PingSection {
    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default = "default_ping_count")]
    pub count: u32,

    /// Ping binary, e.g. `/system/bin/ping`.
    #[serde(default = "default_ping_program")]
    pub program: String,
}

fn default_ping_count() -> u32 {
    DEFAULT_COUNT
}

fn default_ping_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

impl Default for PingSection {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            count: default_ping_count(),
            program: default_ping_program(),
        }
    }
}

/// `[ip]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IpSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Queried in order until one answers.
    #[serde(default = "default_ip_servers")]
    pub servers: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ip_servers() -> Vec<String> {
    vec![SERVER_AKAMAI.to_string(), SERVER_IPIFY.to_string()]
}

impl Default for IpSection {
    fn default() -> Self {
        Self {
            enabled: true,
            servers: default_ip_servers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[dns]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_dns_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub local_source: LocalDnsKind,

    /// Used when `local_source = "resolv_conf"`.
    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: PathBuf,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_dns_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from(DEFAULT_RESOLV_CONF)
}

impl Default for DnsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_dns_endpoint(),
            local_source: LocalDnsKind::default(),
            resolv_conf: default_resolv_conf(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[network_info]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInfoSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from(DEFAULT_SYSFS_NET)
}

impl Default for NetworkInfoSection {
    fn default() -> Self {
        Self {
            enabled: true,
            sysfs_root: default_sysfs_root(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}
