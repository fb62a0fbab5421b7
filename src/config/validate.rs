// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{NetdiagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = NetdiagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Check the semantic rules that serde cannot express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_checks(cfg)?;
    validate_ping(cfg)?;
    validate_ip(cfg)?;
    validate_dns(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> NetdiagError {
    NetdiagError::ConfigError(msg.into())
}

fn ensure_has_checks(cfg: &RawConfigFile) -> Result<()> {
    let any = !cfg.ping.targets.is_empty()
        || cfg.ip.enabled
        || cfg.dns.enabled
        || cfg.network_info.enabled;
    if !any {
        return Err(config_error(
            "config must enable at least one check (ping targets, ip, dns or network_info)",
        ));
    }
    Ok(())
}

fn validate_ping(cfg: &RawConfigFile) -> Result<()> {
    if cfg.ping.targets.is_empty() {
        return Ok(());
    }

    if cfg.ping.count == 0 {
        return Err(config_error("[ping].count must be >= 1 (got 0)"));
    }
    if cfg.ping.program.trim().is_empty() {
        return Err(config_error("[ping].program must not be empty"));
    }
    for target in &cfg.ping.targets {
        if target.trim().is_empty() || target.chars().any(char::is_whitespace) {
            return Err(config_error(format!(
                "[ping].targets contains invalid host '{target}'"
            )));
        }
    }
    Ok(())
}

fn validate_ip(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.ip.enabled {
        return Ok(());
    }

    if cfg.ip.servers.is_empty() {
        return Err(config_error("[ip].servers must not be empty when ip is enabled"));
    }
    for server in &cfg.ip.servers {
        ensure_http_url("[ip].servers", server)?;
    }
    ensure_timeout("[ip].timeout_secs", cfg.ip.timeout_secs)
}

fn validate_dns(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.dns.enabled {
        return Ok(());
    }

    ensure_http_url("[dns].endpoint", &cfg.dns.endpoint)?;
    ensure_timeout("[dns].timeout_secs", cfg.dns.timeout_secs)
}

fn ensure_http_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(config_error(format!(
            "{field} must be an http(s) URL (got '{url}')"
        )))
    }
}

fn ensure_timeout(field: &str, secs: u64) -> Result<()> {
    if secs == 0 {
        return Err(config_error(format!("{field} must be >= 1 (got 0)")));
    }
    Ok(())
}
