// src/tasks/mod.rs

//! Bundled diagnosis tasks.
//!
//! Each task is a plain [`Task`](crate::task::Task) implementation; none of
//! them knows about threads or listeners.
//!
//! - [`simple`] wraps an arbitrary closure.
//! - [`ping`] runs the system `ping` and parses its summary.
//! - [`ip`] resolves the public and local IP addresses.
//! - [`dns`] resolves the public and local DNS servers.
//! - [`network_info`] reports connectivity and link type.
//! - [`io`] holds the HTTP / process helpers the checks share.

pub mod dns;
pub mod io;
pub mod ip;
pub mod network_info;
pub mod ping;
pub mod simple;

pub use dns::{DnsServer, DnsTask, LocalDnsSource};
pub use ip::{Ip, IpTask, int_ip_to_string};
pub use network_info::{NetworkInfo, NetworkInfoTask, is_fast_mobile_network};
pub use ping::{PingResult, PingTask, parse_ping_output};
pub use simple::SimpleTask;
