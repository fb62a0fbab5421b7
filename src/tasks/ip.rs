// src/tasks/ip.rs

//! Public / local IP address check.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;

use tracing::{debug, warn};

use super::io::{DEFAULT_TIMEOUT, read_str_from_url};
use crate::errors::CheckError;
use crate::task::{ProgressSink, Task};

pub const SERVER_IPIFY: &str = "https://api.ipify.org/?format=text";
pub const SERVER_AKAMAI: &str = "http://whatismyip.akamai.com";

/// Packed value meaning "no address known".
pub const UNKNOWN_IP_INT: i32 = -1;
pub const UNKNOWN_IP_STR: &str = "Unknown IP";

/// Any routable address works: connecting a UDP socket sends nothing, it only
/// makes the OS pick the outgoing interface.
const ROUTE_LOOKUP_ADDR: &str = "8.8.8.8:80";

/// Decode an IPv4 address packed little-endian into an `i32` (first octet in
/// the lowest byte), as DHCP info APIs report it.
///
/// [`UNKNOWN_IP_INT`] decodes to [`UNKNOWN_IP_STR`].
pub fn int_ip_to_string(ip: i32) -> String {
    if ip == UNKNOWN_IP_INT {
        return UNKNOWN_IP_STR.to_string();
    }
    let [a, b, c, d] = ip.to_le_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// Inverse of [`int_ip_to_string`].
pub fn ip_to_int(addr: Ipv4Addr) -> i32 {
    i32::from_le_bytes(addr.octets())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ip {
    /// Empty when no server answered.
    pub public_ip: String,
    pub local_ip: String,
}

impl fmt::Display for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = if self.public_ip.is_empty() {
            "<none>"
        } else {
            &self.public_ip
        };
        write!(f, "public {public}, local {}", self.local_ip)
    }
}

/// Resolves the public IP by asking each configured server in turn until one
/// answers, and the local IP of the default outgoing interface.
///
/// Progress is reported after every server tried, as
/// `tried * 100 / (servers + 1)`.
pub struct IpTask {
    servers: Vec<String>,
    timeout: Duration,
}

impl IpTask {
    pub fn new() -> Self {
        Self::with_servers([SERVER_AKAMAI, SERVER_IPIFY])
    }

    pub fn with_servers<S: Into<String>>(servers: impl IntoIterator<Item = S>) -> Self {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    fn public_ip(&self, progress: &ProgressSink) -> String {
        let total = self.servers.len() as u32 + 1;

        for (tried, server) in (1u32..).zip(&self.servers) {
            let answer = read_str_from_url(server, self.timeout);
            progress.report(tried * 100 / total);

            match answer {
                Ok(Some(body)) if !body.trim().is_empty() => {
                    debug!(server = %server, "public ip resolved");
                    return body.trim().to_string();
                }
                Ok(_) => debug!(server = %server, "no usable answer; trying next server"),
                Err(e) => warn!(server = %server, error = %e, "ip server failed; trying next"),
            }
        }

        warn!("no ip server answered");
        String::new()
    }
}

impl Default for IpTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for IpTask {
    type Output = Ip;
    type Error = CheckError;

    fn run(&self, progress: &ProgressSink) -> Result<Ip, CheckError> {
        let public_ip = self.public_ip(progress);
        let local_ip = int_ip_to_string(local_ip_int());
        Ok(Ip {
            public_ip,
            local_ip,
        })
    }

    fn name(&self) -> String {
        format!("ip ({} servers)", self.servers.len())
    }
}

/// Local IPv4 address of the default route, packed like
/// [`int_ip_to_string`] expects; [`UNKNOWN_IP_INT`] when there is none.
fn local_ip_int() -> i32 {
    let lookup = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(ROUTE_LOOKUP_ADDR)?;
        Ok(socket.local_addr()?.ip())
    };

    match lookup() {
        Ok(IpAddr::V4(addr)) if !addr.is_unspecified() => ip_to_int(addr),
        Ok(other) => {
            debug!(addr = %other, "no usable local ipv4 address");
            UNKNOWN_IP_INT
        }
        Err(e) => {
            debug!(error = %e, "local address lookup failed");
            UNKNOWN_IP_INT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_packed_address() {
        let packed = i32::from_le_bytes([192, 168, 1, 5]);
        assert_eq!(int_ip_to_string(packed), "192.168.1.5");
    }

    #[test]
    fn unknown_sentinel_decodes_to_fixed_string() {
        assert_eq!(int_ip_to_string(UNKNOWN_IP_INT), UNKNOWN_IP_STR);
    }

    #[test]
    fn packing_inverts_decoding() {
        let addr = Ipv4Addr::new(10, 0, 0, 42);
        assert_eq!(int_ip_to_string(ip_to_int(addr)), "10.0.0.42");
    }

    #[test]
    fn display_marks_missing_public_ip() {
        let ip = Ip {
            public_ip: String::new(),
            local_ip: "10.0.0.2".to_string(),
        };
        assert_eq!(ip.to_string(), "public <none>, local 10.0.0.2");
    }

    #[test]
    fn default_server_order_tries_akamai_first() {
        let task = IpTask::new();
        assert_eq!(task.servers(), [SERVER_AKAMAI, SERVER_IPIFY]);
    }
}
