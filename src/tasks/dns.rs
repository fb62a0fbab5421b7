// src/tasks/dns.rs

//! Public / local DNS server check.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use super::io::{DEFAULT_TIMEOUT, read_str_from_process, read_str_from_url};
use crate::errors::CheckError;
use crate::task::{ProgressSink, Task};

/// Diagnostic page that embeds the resolver-echo page in an iframe.
pub const DEFAULT_ENDPOINT: &str =
    "http://ns.pbt.cloudxns.net/fast_tools/fetch_ldns_diag_client.php";

pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

static OUTER_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"iframe src="(.+\.php)"#).expect("outer frame regex is valid"));

static INNER_DNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DNS.+>(\d+\.\d+\.\d+\.\d+)").expect("inner dns regex is valid")
});

static GETPROP_DNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[net\.dns\d+\].+\[(\d+\.\d+\.\d+\.\d+)\]").expect("getprop regex is valid")
});

static RESOLV_NAMESERVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*nameserver\s+(\d+\.\d+\.\d+\.\d+)\b").expect("resolv.conf regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsServer {
    /// Resolver seen by the outside world; empty when it could not be found.
    pub public_dns: String,
    pub local_dns: Vec<String>,
}

impl fmt::Display for DnsServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = if self.public_dns.is_empty() {
            "<unknown>"
        } else {
            &self.public_dns
        };
        write!(f, "public {public}, local [{}]", self.local_dns.join(", "))
    }
}

/// Where the locally configured resolvers are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalDnsSource {
    /// Android property dump (`getprop`).
    GetProp,
    /// A `resolv.conf`-style file.
    ResolvConf(PathBuf),
}

impl Default for LocalDnsSource {
    fn default() -> Self {
        if cfg!(target_os = "android") {
            LocalDnsSource::GetProp
        } else {
            LocalDnsSource::ResolvConf(PathBuf::from(DEFAULT_RESOLV_CONF))
        }
    }
}

/// Extract the URL of the resolver-echo iframe from the diagnostic page.
pub fn parse_outer_frame(html: &str) -> Option<String> {
    let flat = html.replace('\n', "");
    OUTER_FRAME.captures(&flat).map(|c| c[1].to_string())
}

/// Extract the resolver address from the resolver-echo page.
pub fn parse_public_dns(html: &str) -> Option<String> {
    let flat = html.replace('\n', "");
    INNER_DNS.captures(&flat).map(|c| c[1].to_string())
}

/// Collect `net.dnsN` values from a `getprop` dump, in order.
pub fn parse_getprop_dns(dump: &str) -> Vec<String> {
    GETPROP_DNS
        .captures_iter(dump)
        .map(|c| c[1].to_string())
        .collect()
}

/// Collect IPv4 `nameserver` entries from a `resolv.conf`.
pub fn parse_resolv_conf(contents: &str) -> Vec<String> {
    RESOLV_NAMESERVER
        .captures_iter(contents)
        .map(|c| c[1].to_string())
        .collect()
}

/// Resolves the public resolver via a two-stage HTML page, and the local
/// resolvers from [`LocalDnsSource`].
///
/// Pages that do not match are logged and yield an empty `public_dns`;
/// transport failures are task errors.
pub struct DnsTask {
    endpoint: String,
    local_source: LocalDnsSource,
    timeout: Duration,
}

impl DnsTask {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            local_source: LocalDnsSource::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_local_source(mut self, source: LocalDnsSource) -> Self {
        self.local_source = source;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn detect_public_dns(&self) -> Result<String, CheckError> {
        let outer = read_str_from_url(&self.endpoint, self.timeout)?.unwrap_or_default();
        let Some(frame_url) = parse_outer_frame(&outer) else {
            warn!(endpoint = %self.endpoint, "failed to resolve outer frame of dns response");
            return Ok(String::new());
        };

        let inner = read_str_from_url(&frame_url, self.timeout)?.unwrap_or_default();
        debug!(frame = %frame_url, len = inner.len(), "fetched resolver echo page");
        match parse_public_dns(&inner) {
            Some(dns) => Ok(dns),
            None => {
                warn!(frame = %frame_url, "failed to resolve inner dns response");
                Ok(String::new())
            }
        }
    }

    fn detect_local_dns(&self) -> Result<Vec<String>, CheckError> {
        match &self.local_source {
            LocalDnsSource::GetProp => Ok(parse_getprop_dns(&read_str_from_process("getprop", &[])?)),
            LocalDnsSource::ResolvConf(path) => Ok(parse_resolv_conf(&fs::read_to_string(path)?)),
        }
    }
}

impl Default for DnsTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for DnsTask {
    type Output = DnsServer;
    type Error = CheckError;

    fn run(&self, progress: &ProgressSink) -> Result<DnsServer, CheckError> {
        let public_dns = self.detect_public_dns()?;
        progress.report(50);
        let local_dns = self.detect_local_dns()?;
        Ok(DnsServer {
            public_dns,
            local_dns,
        })
    }

    fn name(&self) -> String {
        "dns".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_outer_frame_across_newlines() {
        let html = "<html>\n<body><iframe src=\"http://abc.example/\nlookup.php\" width=0></iframe>";
        assert_eq!(
            parse_outer_frame(html).as_deref(),
            Some("http://abc.example/lookup.php")
        );
    }

    #[test]
    fn outer_frame_missing_yields_none() {
        assert_eq!(parse_outer_frame("<html>nothing here</html>"), None);
    }

    #[test]
    fn finds_public_dns_in_echo_page() {
        let html = "<tr><td>Your DNS</td>\n<td>202.96.128.86</td></tr>";
        assert_eq!(parse_public_dns(html).as_deref(), Some("202.96.128.86"));
    }

    #[test]
    fn parses_getprop_dump() {
        let dump = "[net.bt.name]: [Android]\n\
                    [net.dns1]: [10.0.0.1]\n\
                    [net.dns2]: [8.8.4.4]\n\
                    [net.hostname]: [phone]\n";
        assert_eq!(parse_getprop_dns(dump), vec!["10.0.0.1", "8.8.4.4"]);
    }

    #[test]
    fn parses_resolv_conf_ipv4_entries() {
        let conf = "# generated\nnameserver 127.0.0.53\nnameserver ::1\noptions edns0\n  nameserver 1.1.1.1\n";
        assert_eq!(parse_resolv_conf(conf), vec!["127.0.0.53", "1.1.1.1"]);
    }

    #[test]
    fn reads_local_dns_from_resolv_conf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        fs::write(&path, "nameserver 9.9.9.9\n").unwrap();

        let task = DnsTask::new().with_local_source(LocalDnsSource::ResolvConf(path));
        assert_eq!(task.detect_local_dns().unwrap(), vec!["9.9.9.9"]);
    }

    #[test]
    fn display_lists_local_servers() {
        let dns = DnsServer {
            public_dns: String::new(),
            local_dns: vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()],
        };
        assert_eq!(dns.to_string(), "public <unknown>, local [1.1.1.1, 8.8.8.8]");
    }
}
