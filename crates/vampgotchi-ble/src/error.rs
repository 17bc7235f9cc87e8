use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `vampgotchi-ble` crate.
///
/// Covers every way a tool invocation can go wrong: the program is missing
/// or not executable, it ran too long, it was cancelled, it exited badly, or
/// it printed something unreadable. `vampgotchi-core` maps these into
/// `BackendError` kinds.
#[derive(Debug, Error)]
pub enum Error {
    // ── Launch ──────────────────────────────────────────────────────
    /// Interpreter or script does not exist.
    #[error("BLE tool not found at {}", .path.display())]
    ToolNotFound { path: PathBuf },

    /// The OS refused to execute the tool (usually: not running as root).
    #[error("permission denied launching {}", .path.display())]
    PermissionDenied { path: PathBuf },

    // ── Runtime ─────────────────────────────────────────────────────
    /// The hard wall-clock limit elapsed; the process was killed.
    #[error("BLE tool timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// A cancellation was requested while the tool was running.
    #[error("BLE tool run cancelled")]
    Cancelled,

    /// Non-zero exit status (or killed by a signal when `exit_code` is `None`).
    #[error("BLE tool exited with {}: {stderr}", describe_exit(.exit_code.as_ref()))]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Output could not be decoded at all (individual bad lines are skipped, not reported).
    #[error("malformed tool output: {reason}")]
    MalformedOutput { reason: String },

    /// Pipe or wait failure after a successful spawn.
    #[error("BLE tool I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: Option<&i32>) -> String {
    code.map_or_else(|| "a signal".to_owned(), |c| format!("status {c}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failed_message_names_exit_status() {
        let err = Error::ProcessFailed {
            exit_code: Some(3),
            stderr: "adapter busy".into(),
        };
        assert_eq!(err.to_string(), "BLE tool exited with status 3: adapter busy");
    }

    #[test]
    fn process_failed_message_for_signal() {
        let err = Error::ProcessFailed {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("a signal"));
    }
}
