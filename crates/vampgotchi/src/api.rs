//! Request/response bodies of the web console, shared by the server
//! ([`crate::web`]) and the remote client ([`crate::client`]).

use serde::{Deserialize, Serialize};

use vampgotchi_core::{Ink, NetworkMode, SystemState, ThemePreset};

/// `GET /api/status`: the snapshot plus display-derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub state: SystemState,
    /// `"Xd HHh MMm"`.
    pub uptime: String,
    pub ip: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WaitQuery {
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Seconds; the daemon default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRequest {
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttackRequest {
    /// Attacked instead of the current selection; becomes the selection
    /// once the attack is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Seconds; the daemon default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub mode: NetworkMode,
}

/// Either `{ "preset": "white" }` or `{ "foreground": .., "background": .. }`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThemeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<ThemePreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Ink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Ink>,
}

/// Error envelope: `{ "error": { "code": "...", "message": "..." } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
