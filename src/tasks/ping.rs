// src/tasks/ping.rs

//! `ping` check.

use std::fmt;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::errors::CheckError;
use crate::task::{ProgressSink, Task};

/// Summary lines as printed by iputils `ping`:
///
/// ```text
/// 4 packets transmitted, 4 received, 0% packet loss, time 3004ms
/// rtt min/avg/max/mdev = 10.0/12.5/15.0/1.2 ms
/// ```
static PING_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+) packets transmitted, (\d+) received, (\d+)% packet loss, time (\d+)ms[\s\n\t]+rtt min/avg/max/mdev = ([\d.]+)/([\d.]+)/([\d.]+)/([\d.]+) ms",
    )
    .expect("ping summary regex is valid")
});

pub const DEFAULT_COUNT: u32 = 4;
pub const DEFAULT_PROGRAM: &str = "ping";

/// Parsed `ping` statistics.
///
/// RTTs are in milliseconds; they are `NaN` when the output could not be
/// parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingResult {
    pub transmitted: u32,
    pub received: u32,
    /// Packet loss in percent.
    pub loss: u32,
    pub min_rtt: f32,
    pub avg_rtt: f32,
    pub max_rtt: f32,
}

impl PingResult {
    /// Result used when the output is unparsable: every packet counted as
    /// lost.
    pub fn unreachable(count: u32) -> Self {
        Self {
            transmitted: count,
            received: 0,
            loss: 100,
            min_rtt: f32::NAN,
            avg_rtt: f32::NAN,
            max_rtt: f32::NAN,
        }
    }
}

impl fmt::Display for PingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} received, {}% loss, rtt min/avg/max = {}/{}/{} ms",
            self.received, self.transmitted, self.loss, self.min_rtt, self.avg_rtt, self.max_rtt
        )
    }
}

/// Parse `ping` output.
///
/// Never fails: output that does not contain the summary yields
/// [`PingResult::unreachable`] for `count` packets. Numeric fields that do not
/// parse fall back to `0`.
pub fn parse_ping_output(output: &str, count: u32) -> PingResult {
    let Some(caps) = PING_SUMMARY.captures(output) else {
        warn!("failed to match ping summary; reporting all packets lost");
        return PingResult::unreachable(count);
    };

    let int = |i: usize| caps[i].parse::<u32>().unwrap_or(0);
    let float = |i: usize| caps[i].parse::<f32>().unwrap_or(0.0);

    debug!("parsed ping summary");
    PingResult {
        transmitted: int(1),
        received: int(2),
        loss: int(3),
        min_rtt: float(5),
        avg_rtt: float(6),
        max_rtt: float(7),
    }
}

/// Runs `<program> -c <count> <target>` and parses the summary.
///
/// [`Task::cancel`] kills the running process; `run` then returns whatever
/// could be parsed (usually the all-lost result).
pub struct PingTask {
    target: String,
    count: u32,
    program: String,
    child: Mutex<Option<Child>>,
}

impl PingTask {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            count: DEFAULT_COUNT,
            program: DEFAULT_PROGRAM.to_string(),
            child: Mutex::new(None),
        }
    }

    /// Number of echo requests (`-c`).
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Path or name of the ping binary, e.g. `/system/bin/ping`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    fn child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Task for PingTask {
    type Output = PingResult;
    type Error = CheckError;

    fn run(&self, _progress: &ProgressSink) -> Result<PingResult, CheckError> {
        info!(host = %self.target, count = self.count, "starting ping");

        let mut child = Command::new(&self.program)
            .arg("-c")
            .arg(self.count.to_string())
            .arg(&self.target)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CheckError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        // Park the child so `cancel` can reach it while we block on the pipes.
        *self.child() = Some(child);

        // Drain stderr on its own thread so a chatty child cannot block on
        // either pipe while we read the other.
        let stderr_reader = stderr.map(|mut stderr| {
            thread::spawn(move || {
                let mut errors = String::new();
                let _ = stderr.read_to_string(&mut errors);
                errors
            })
        });

        let mut output = String::new();
        let read = match stdout {
            Some(mut stdout) => stdout.read_to_string(&mut output).map(drop),
            None => Ok(()),
        };
        let errors = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        // Reap the child before surfacing a read error.
        let status = match self.child().take() {
            Some(mut child) => Some(child.wait()?),
            None => None,
        };
        read?;

        match status {
            Some(status) if status.success() => {
                debug!(host = %self.target, "ping exited successfully");
            }
            Some(status) => {
                warn!(
                    host = %self.target,
                    exit_code = status.code().unwrap_or(-1),
                    stderr = %errors.trim(),
                    "ping exited with failure"
                );
            }
            None => debug!(host = %self.target, "ping child already reaped"),
        }

        Ok(parse_ping_output(&output, self.count))
    }

    fn cancel(&self) {
        if let Some(child) = self.child().as_mut() {
            match child.kill() {
                Ok(()) => info!(host = %self.target, "ping cancelled; process killed"),
                Err(e) => debug!(host = %self.target, error = %e, "ping already exited"),
            }
        }
    }

    fn name(&self) -> String {
        format!("ping {} x{}", self.target, self.count)
    }
}
