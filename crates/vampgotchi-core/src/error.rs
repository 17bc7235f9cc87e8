// ── Core error types ──
//
// Two families, never mixed:
// - `CommandError`: the caller asked for something the current state does
//   not allow. Returned synchronously, never recorded in `lastError`.
// - `BackendError`: the environment failed (tool missing, timeout, crash).
//   Delivered through the completion path and recorded in `lastError`.
//
// The `From<vampgotchi_ble::Error>` impl translates process-level failures
// into backend error kinds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DeviceAddress, Mode};

// ── CommandError ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Busy: a {mode} operation is already running")]
    AlreadyBusy { mode: Mode },

    #[error("Unknown device: {address}")]
    UnknownDevice { address: DeviceAddress },

    #[error("No target selected")]
    NoTargetSelected,

    #[error("Invalid theme: {reason}")]
    InvalidTheme { reason: String },
}

impl CommandError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyBusy { .. } => "ALREADY_BUSY",
            Self::UnknownDevice { .. } => "UNKNOWN_DEVICE",
            Self::NoTargetSelected => "NO_TARGET_SELECTED",
            Self::InvalidTheme { .. } => "INVALID_THEME",
        }
    }
}

// ── BackendError ─────────────────────────────────────────────────────

/// Classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BackendErrorKind {
    ToolNotFound,
    PermissionDenied,
    Timeout,
    MalformedOutput,
    ProcessFailed { exit_code: Option<i32> },
    Cancelled,
}

impl BackendErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Timeout => "TIMEOUT",
            Self::MalformedOutput => "MALFORMED_OUTPUT",
            Self::ProcessFailed { .. } => "PROCESS_FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// A failed scan or attack.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct BackendError {
    #[serde(flatten)]
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(BackendErrorKind::Cancelled, "operation cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == BackendErrorKind::Cancelled
    }
}

impl From<vampgotchi_ble::Error> for BackendError {
    fn from(err: vampgotchi_ble::Error) -> Self {
        let kind = match &err {
            vampgotchi_ble::Error::ToolNotFound { .. } => BackendErrorKind::ToolNotFound,
            vampgotchi_ble::Error::PermissionDenied { .. } => BackendErrorKind::PermissionDenied,
            vampgotchi_ble::Error::Timeout { .. } => BackendErrorKind::Timeout,
            vampgotchi_ble::Error::Cancelled => BackendErrorKind::Cancelled,
            vampgotchi_ble::Error::MalformedOutput { .. } => BackendErrorKind::MalformedOutput,
            vampgotchi_ble::Error::ProcessFailed { exit_code, .. } => {
                BackendErrorKind::ProcessFailed {
                    exit_code: *exit_code,
                }
            }
            vampgotchi_ble::Error::Io(_) => BackendErrorKind::ProcessFailed { exit_code: None },
        };
        Self::new(kind, err.to_string())
    }
}

// ── CoreError ────────────────────────────────────────────────────────

/// Either family, for callers that wait on a command's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
