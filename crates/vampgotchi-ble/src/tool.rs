// BLEeding process client
//
// Spawns the tool as `<interpreter> <script> <verb> ... --timeout N` inside
// its checkout directory. The requested timeout is the hard kill deadline.
// The tool is told `stop_margin` less than that so it can finish on its own
// and flush output before the deadline.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::parse::{RawDevice, parse_scan_output};

/// Max bytes of stderr carried inside `Error::ProcessFailed`.
const STDERR_TAIL: usize = 512;

/// Where the tool lives and how to launch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Interpreter binary, resolved through `PATH` when relative (e.g. `python3`).
    pub interpreter: PathBuf,
    /// Script path, relative to `working_dir` unless absolute.
    pub script: PathBuf,
    /// BLEeding checkout; the tool expects to run from here.
    pub working_dir: PathBuf,
    /// Subtracted from the timeout handed to the tool. Never extends the
    /// kill deadline.
    pub stop_margin: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python3"),
            script: PathBuf::from("bleeding.py"),
            working_dir: PathBuf::from("/root/BLEeding"),
            stop_margin: Duration::from_secs(1),
        }
    }
}

impl ToolConfig {
    /// Absolute (or cwd-relative) location of the script on disk.
    pub fn script_path(&self) -> PathBuf {
        self.working_dir.join(&self.script)
    }

    /// Seconds passed to the tool's own `--timeout`: the deadline minus the
    /// stop margin, at least 1.
    pub fn tool_timeout_secs(&self, deadline: Duration) -> u64 {
        deadline.saturating_sub(self.stop_margin).as_secs().max(1)
    }
}

/// Captured output of one completed tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Result of a successful scan run.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub devices: Vec<RawDevice>,
    /// Lines that were not recognisable device records.
    pub skipped_lines: usize,
    pub elapsed: Duration,
}

/// Handle to the external BLEeding tool.
///
/// Cheaply cloneable; clones share the last-scan transcript so a debug
/// endpoint can show what the tool actually printed.
#[derive(Debug, Clone)]
pub struct BleedingClient {
    config: Arc<ToolConfig>,
    last_scan_output: Arc<ArcSwapOption<String>>,
}

impl BleedingClient {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config: Arc::new(config),
            last_scan_output: Arc::new(ArcSwapOption::empty()),
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Raw stdout + stderr of the most recent scan that produced output.
    pub fn last_scan_output(&self) -> Option<Arc<String>> {
        self.last_scan_output.load_full()
    }

    /// Run `scan --ble --headless --timeout N` and parse what it prints.
    ///
    /// Zero recognised devices is a successful, empty scan.
    pub async fn scan(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ScanOutput, Error> {
        let args = vec![
            "scan".to_owned(),
            "--ble".to_owned(),
            "--headless".to_owned(),
            "--timeout".to_owned(),
            self.config.tool_timeout_secs(timeout).to_string(),
        ];
        let started = Instant::now();
        let output = self.run(&args, timeout, cancel).await?;

        let transcript = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        self.last_scan_output.store(Some(Arc::new(transcript)));

        let decoded = decode(output)?;
        let parsed = parse_scan_output(&decoded.stdout);
        debug!(
            devices = parsed.devices.len(),
            skipped = parsed.skipped,
            "scan output parsed"
        );

        Ok(ScanOutput {
            devices: parsed.devices,
            skipped_lines: parsed.skipped,
            elapsed: started.elapsed(),
        })
    }

    /// Run `deauth <address> --ble --timeout N` against one target.
    pub async fn deauth(
        &self,
        address: &str,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, Error> {
        let args = vec![
            "deauth".to_owned(),
            address.to_owned(),
            "--ble".to_owned(),
            "--timeout".to_owned(),
            self.config.tool_timeout_secs(duration).to_string(),
        ];
        let started = Instant::now();
        let output = self.run(&args, duration, cancel).await?;
        let mut decoded = decode(output)?;
        decoded.elapsed = started.elapsed();
        Ok(decoded)
    }

    async fn run(
        &self,
        args: &[String],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Output, Error> {
        let script = self.config.script_path();
        if !script.exists() {
            return Err(Error::ToolNotFound { path: script });
        }

        trace!(interpreter = %self.config.interpreter.display(), ?args, "spawning BLE tool");

        // kill_on_drop: leaving the select below (timeout or cancel) drops
        // the wait future, which owns the child, which kills the process.
        let child = Command::new(&self.config.interpreter)
            .arg(&self.config.script)
            .args(args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(e, &self.config.interpreter))?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("BLE tool run cancelled, killing child");
                Err(Error::Cancelled)
            }
            result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
                Ok(output) => Ok(output?),
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs_f64(), "BLE tool exceeded its timeout, killed");
                    Err(Error::Timeout { timeout_secs: timeout.as_secs() })
                }
            },
        }
    }
}

/// Check the exit status and decode stdout.
fn decode(output: Output) -> Result<ToolOutput, Error> {
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(Error::ProcessFailed {
            exit_code: output.status.code(),
            stderr: tail(&stderr, STDERR_TAIL).to_owned(),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| Error::MalformedOutput {
        reason: format!("stdout is not valid UTF-8: {e}"),
    })?;

    Ok(ToolOutput {
        stdout,
        stderr,
        elapsed: Duration::ZERO,
    })
}

fn spawn_error(err: std::io::Error, interpreter: &Path) -> Error {
    match err.kind() {
        ErrorKind::NotFound => Error::ToolNotFound {
            path: interpreter.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Error::PermissionDenied {
            path: interpreter.to_path_buf(),
        },
        _ => Error::Io(err),
    }
}

/// Last `max` bytes of `s`, snapped forward to a char boundary.
fn tail(s: &str, max: usize) -> &str {
    let s = s.trim_end();
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s.get(start..).unwrap_or(s)
}
