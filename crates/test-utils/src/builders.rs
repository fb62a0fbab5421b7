#![allow(dead_code)]

use std::path::Path;

use netdiag::config::{ConfigFile, RawConfigFile};
use netdiag::types::{LocalDnsKind, RunMode};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from a config with every check disabled; enable the ones the test
/// needs.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.ip.enabled = false;
        config.dns.enabled = false;
        config.network_info.enabled = false;
        Self { config }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.config.config.mode = mode;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.config.debug = debug;
        self
    }

    pub fn with_abort_on_error(mut self, abort: bool) -> Self {
        self.config.config.abort_on_error = abort;
        self
    }

    pub fn with_ping_target(mut self, target: &str) -> Self {
        self.config.ping.targets.push(target.to_string());
        self
    }

    pub fn with_ping_count(mut self, count: u32) -> Self {
        self.config.ping.count = count;
        self
    }

    pub fn with_ip_servers(mut self, servers: &[&str]) -> Self {
        self.config.ip.enabled = true;
        self.config.ip.servers = servers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_dns_resolv_conf(mut self, path: &Path) -> Self {
        self.config.dns.enabled = true;
        self.config.dns.local_source = LocalDnsKind::ResolvConf;
        self.config.dns.resolv_conf = path.to_path_buf();
        self
    }

    pub fn with_network_info(mut self, sysfs_root: &Path) -> Self {
        self.config.network_info.enabled = true;
        self.config.network_info.sysfs_root = sysfs_root.to_path_buf();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
