// src/tasks/io.rs

//! Blocking HTTP and process helpers used by the checks.

use std::process::Command;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::errors::CheckError;

/// Responses larger than this are ignored.
pub const MAX_BODY_LEN: u64 = 1024 * 1024;

/// Default connect/read timeout for check requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch `url` as text.
///
/// Returns `Ok(None)` when the server answers with anything but `200 OK` or
/// announces a body over [`MAX_BODY_LEN`]. Transport failures are errors.
///
/// Blocking: only call from the background context.
pub fn read_str_from_url(url: &str, timeout: Duration) -> Result<Option<String>, CheckError> {
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;

    let response = client.get(url).send()?;
    let status = response.status();
    if status != StatusCode::OK {
        debug!(url, %status, "non-OK response; ignoring body");
        return Ok(None);
    }
    if response.content_length().is_some_and(|len| len > MAX_BODY_LEN) {
        debug!(url, "response body too large; ignoring");
        return Ok(None);
    }

    Ok(Some(response.text()?))
}

/// Run `program args...` to completion and return its output.
///
/// On a zero exit status this is stdout; otherwise stderr is returned (and
/// logged), mirroring what a shell user would look at.
pub fn read_str_from_process(program: &str, args: &[&str]) -> Result<String, CheckError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| CheckError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let code = output.status.code().unwrap_or(-1);
    debug!(program, exit_code = code, "process exited");

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(program, exit_code = code, stderr = %stderr.trim(), "process failed");
        Ok(stderr)
    }
}
