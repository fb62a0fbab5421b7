// src/tasks/network_info.rs

//! Connectivity / link type check backed by Linux sysfs.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::CheckError;
use crate::task::{ProgressSink, Task};

pub const DEFAULT_SYSFS_NET: &str = "/sys/class/net";

// Mobile network type codes, as reported by telephony APIs.
pub const NETWORK_TYPE_UNKNOWN: i32 = 0;
pub const NETWORK_TYPE_GPRS: i32 = 1;
pub const NETWORK_TYPE_EDGE: i32 = 2;
pub const NETWORK_TYPE_UMTS: i32 = 3;
pub const NETWORK_TYPE_CDMA: i32 = 4;
pub const NETWORK_TYPE_EVDO_0: i32 = 5;
pub const NETWORK_TYPE_EVDO_A: i32 = 6;
pub const NETWORK_TYPE_1XRTT: i32 = 7;
pub const NETWORK_TYPE_HSDPA: i32 = 8;
pub const NETWORK_TYPE_HSUPA: i32 = 9;
pub const NETWORK_TYPE_HSPA: i32 = 10;
pub const NETWORK_TYPE_IDEN: i32 = 11;
pub const NETWORK_TYPE_EVDO_B: i32 = 12;
pub const NETWORK_TYPE_LTE: i32 = 13;
pub const NETWORK_TYPE_EHRPD: i32 = 14;
pub const NETWORK_TYPE_HSPAP: i32 = 15;

/// Whether a mobile network type is fast enough for everyday use.
pub fn is_fast_mobile_network(network_type: i32) -> bool {
    matches!(
        network_type,
        NETWORK_TYPE_EVDO_0 // ~ 400-1000 kbps
            | NETWORK_TYPE_EVDO_A // ~ 600-1400 kbps
            | NETWORK_TYPE_EVDO_B // ~ 5 Mbps
            | NETWORK_TYPE_HSPA // ~ 700-1700 kbps
            | NETWORK_TYPE_HSDPA // ~ 2-14 Mbps
            | NETWORK_TYPE_HSUPA // ~ 1-23 Mbps
            | NETWORK_TYPE_HSPAP // ~ 10-20 Mbps
            | NETWORK_TYPE_UMTS // ~ 400-7000 kbps
            | NETWORK_TYPE_EHRPD // ~ 1-2 Mbps
            | NETWORK_TYPE_LTE // ~ 10+ Mbps
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Any non-loopback interface is up.
    pub is_connected: bool,
    /// An interface that is up is a wireless one.
    pub is_wifi: bool,
    /// One of the `NETWORK_TYPE_*` codes.
    pub telephony_type: i32,
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connected={} wifi={} telephony_type={}",
            self.is_connected, self.is_wifi, self.telephony_type
        )
    }
}

/// Reads interface state from `<sysfs_root>/<iface>/{operstate,wireless}`.
///
/// Hosts expose no telephony API, so `telephony_type` is always
/// [`NETWORK_TYPE_UNKNOWN`].
pub struct NetworkInfoTask {
    sysfs_root: PathBuf,
}

impl NetworkInfoTask {
    pub fn new() -> Self {
        Self::with_sysfs_root(DEFAULT_SYSFS_NET)
    }

    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
        }
    }
}

impl Default for NetworkInfoTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for NetworkInfoTask {
    type Output = NetworkInfo;
    type Error = CheckError;

    fn run(&self, progress: &ProgressSink) -> Result<NetworkInfo, CheckError> {
        let mut is_connected = false;
        let mut is_wifi = false;

        for entry in fs::read_dir(&self.sysfs_root)? {
            let entry = entry?;
            let iface = entry.file_name();
            if iface == "lo" {
                continue;
            }
            let path = entry.path();
            if !is_up(&path) {
                continue;
            }
            let wireless = path.join("wireless").is_dir();
            debug!(iface = %iface.to_string_lossy(), wireless, "interface is up");
            is_connected = true;
            is_wifi |= wireless;
        }
        progress.report(67);

        Ok(NetworkInfo {
            is_connected,
            is_wifi,
            telephony_type: NETWORK_TYPE_UNKNOWN,
        })
    }

    fn name(&self) -> String {
        "network info".to_string()
    }
}

fn is_up(iface: &Path) -> bool {
    fs::read_to_string(iface.join("operstate"))
        .map(|state| state.trim() == "up")
        .unwrap_or(false)
}
