//! External tool runner.
//!
//! Wraps the handful of external commands proxysweep talks to (gsettings,
//! kwriteconfig, git, npm, snap, ipconfig, …) with captured output and a
//! bounded timeout, and classifies failures so callers can tell "tool is not
//! installed" apart from "tool ran and said no".
//!
//! All invocations are fixed argv arrays; nothing here goes through a shell.
//! Callers only run short commands with small output, so stdout/stderr are
//! drained after the process exits.

use std::io;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Default timeout for quick configuration queries and mutations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for commands that can take a little longer (netsh, CheckNetIsolation).
pub const LONG_TIMEOUT: Duration = Duration::from_secs(15);

/// Captured output of a tool that exited with status 0.
///
/// Standard error of a successful invocation is discarded; a failing one
/// carries its stderr in `ToolFailure::Exited`.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output, trimmed.
    pub stdout: String,
}

/// Why a tool invocation did not produce usable output.
#[derive(Debug)]
pub enum ToolFailure {
    /// The program could not be found on PATH.
    NotInstalled(String),
    /// The process outlived the timeout and was killed.
    TimedOut(String),
    /// The process exited with a non-zero status.
    Exited {
        program: String,
        code: i32,
        stderr: String,
    },
    /// Spawning or waiting failed at the OS level.
    Io(String),
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolFailure::NotInstalled(program) => write!(f, "{} is not installed", program),
            ToolFailure::TimedOut(program) => write!(f, "{} timed out", program),
            ToolFailure::Exited {
                program,
                code,
                stderr,
            } => {
                if stderr.is_empty() {
                    write!(f, "{} exited with code {}", program, code)
                } else {
                    write!(f, "{} exited with code {}: {}", program, code, stderr)
                }
            }
            ToolFailure::Io(msg) => write!(f, "{}", msg),
        }
    }
}

impl ToolFailure {
    /// True when the failure means the tool is simply absent from the system.
    pub fn is_not_installed(&self) -> bool {
        matches!(self, ToolFailure::NotInstalled(_))
    }
}

/// Run an external tool with a bounded timeout and captured output.
///
/// Returns `Ok` only for a zero exit status; every other outcome is a
/// `ToolFailure`. On timeout the process is killed before returning.
pub fn run_tool(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> std::result::Result<ToolOutput, ToolFailure> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ToolFailure::NotInstalled(program.to_string())
            } else {
                ToolFailure::Io(format!("failed to spawn {}: {}", program, e))
            }
        })?;

    if !wait_with_timeout(&mut child, timeout)? {
        kill_child(&mut child);
        return Err(ToolFailure::TimedOut(program.to_string()));
    }

    let output = child
        .wait_with_output()
        .map_err(|e| ToolFailure::Io(format!("failed to collect output of {}: {}", program, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if output.status.success() {
        Ok(ToolOutput { stdout })
    } else {
        Err(ToolFailure::Exited {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run a tool and keep only its trimmed stdout, discarding any failure.
///
/// For probes where absence, failure, and empty output all mean the same
/// thing: nothing to report.
pub fn probe_tool(program: &str, args: &[&str]) -> Option<String> {
    match run_tool(program, args, DEFAULT_TIMEOUT) {
        Ok(output) if !output.stdout.is_empty() => Some(output.stdout),
        _ => None,
    }
}

/// Poll until the child exits or the timeout elapses.
///
/// Returns `Ok(true)` when the child exited, `Ok(false)` on timeout.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<bool, ToolFailure> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(_)) => return Ok(true),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    return Ok(false);
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(ToolFailure::Io(format!(
                    "failed to check process status: {}",
                    e
                )));
            }
        }
    }
}

/// Kill a child process and reap it.
fn kill_child(child: &mut Child) {
    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
    let _ = child.kill();
    let _ = child.wait();
}
