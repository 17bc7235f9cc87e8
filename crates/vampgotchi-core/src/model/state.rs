// ── System state ──
//
// The singleton owned by the coordinator. Readers only ever receive
// immutable snapshots of it.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::address::DeviceAddress;
use super::device::DeviceRecord;
use super::theme::Theme;
use super::vitals::Vitals;
use crate::error::{BackendError, BackendErrorKind};

/// Entries kept in the activity log.
pub const ACTIVITY_LOG_LEN: usize = 5;

// ── Enumerations ────────────────────────────────────────────────────

/// What the appliance is doing right now.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Mode {
    #[default]
    Idle,
    Scanning,
    Attacking,
    Error,
}

impl Mode {
    /// A scan or attack is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Scanning | Self::Attacking)
    }
}

/// The character's displayed mood.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Mood {
    #[default]
    Bored,
    Happy,
    Excited,
    Sad,
    Angry,
}

/// How the Wi-Fi interface is configured.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NetworkMode {
    AccessPoint,
    #[default]
    Client,
}

impl NetworkMode {
    /// Short label for the panel.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::AccessPoint => "AP",
            Self::Client => "CLIENT",
        }
    }
}

// ── Counters & errors ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub total_scans: u64,
    pub total_attacks: u64,
    pub devices_found_last_scan: usize,
}

/// The most recent backend failure, kept for display until a later
/// operation succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    #[serde(flatten)]
    pub kind: BackendErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl LastError {
    pub fn new(error: BackendError, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind: error.kind,
            message: error.message,
            occurred_at,
        }
    }
}

// ── Activity log ────────────────────────────────────────────────────

/// Messages shown in the panel's activity strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ActivityEvent {
    #[strum(serialize = "> Scanning...")]
    ScanStarted,
    #[strum(serialize = "> Found devices!")]
    DevicesFound,
    #[strum(serialize = "> No devices found")]
    NoDevices,
    #[strum(serialize = "> Level up!")]
    LevelUp,
    #[strum(serialize = "> Attacking target!")]
    AttackStarted,
    #[strum(serialize = "> Attack completed!")]
    AttackCompleted,
    #[strum(serialize = "> Scan failed")]
    ScanFailed,
    #[strum(serialize = "> Attack failed")]
    AttackFailed,
    #[strum(serialize = "> Stopped")]
    Stopped,
}

/// Bounded, oldest-first list of recent activity messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog(VecDeque<String>);

impl ActivityLog {
    pub fn push(&mut self, event: ActivityEvent) {
        if self.0.len() == ACTIVITY_LOG_LEN {
            self.0.pop_front();
        }
        self.0.push_back(event.to_string());
    }

    /// The newest `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &str> {
        self.0.iter().skip(self.0.len().saturating_sub(n)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── SystemState ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub mode: Mode,
    pub mood: Mood,
    /// Discovery order.
    pub devices: Vec<DeviceRecord>,
    /// Always an address present in `devices` when set.
    pub selected_target: Option<DeviceAddress>,
    pub counters: Counters,
    pub last_error: Option<LastError>,
    pub network_mode: NetworkMode,
    pub theme: Theme,
    pub vitals: Vitals,
    pub activity: ActivityLog,
    pub started_at: DateTime<Utc>,
}

impl SystemState {
    pub fn new(started_at: DateTime<Utc>, network_mode: NetworkMode, theme: Theme) -> Self {
        Self {
            mode: Mode::Idle,
            mood: Mood::Bored,
            devices: Vec::new(),
            selected_target: None,
            counters: Counters::default(),
            last_error: None,
            network_mode,
            theme,
            vitals: Vitals::default(),
            activity: ActivityLog::default(),
            started_at,
        }
    }

    pub fn device(&self, address: &DeviceAddress) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| &d.address == address)
    }

    pub fn selected_device(&self) -> Option<&DeviceRecord> {
        self.selected_target.as_ref().and_then(|a| self.device(a))
    }

    pub fn uptime(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.started_at).max(TimeDelta::zero())
    }
}

/// `"Xd HHh MMm"`, e.g. `"0d 03h 07m"`.
pub fn format_uptime(elapsed: TimeDelta) -> String {
    let minutes = elapsed.num_minutes().max(0);
    let days = minutes / (24 * 60);
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;
    format!("{days}d {hours:02}h {mins:02}m")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn activity_log_keeps_last_five() {
        let mut log = ActivityLog::default();
        log.push(ActivityEvent::ScanStarted);
        for _ in 0..5 {
            log.push(ActivityEvent::NoDevices);
        }
        assert_eq!(log.len(), ACTIVITY_LOG_LEN);
        assert!(log.recent(5).all(|m| m == "> No devices found"));
    }

    #[test]
    fn activity_log_recent_is_oldest_first() {
        let mut log = ActivityLog::default();
        log.push(ActivityEvent::ScanStarted);
        log.push(ActivityEvent::DevicesFound);
        log.push(ActivityEvent::LevelUp);
        let recent: Vec<&str> = log.recent(2).collect();
        assert_eq!(recent, vec!["> Found devices!", "> Level up!"]);
    }

    #[test]
    fn uptime_format() {
        let d = TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(7);
        assert_eq!(format_uptime(d), "2d 03h 07m");
        assert_eq!(format_uptime(TimeDelta::seconds(59)), "0d 00h 00m");
    }

    #[test]
    fn mode_wire_names() {
        assert_eq!(serde_json::to_string(&Mode::Scanning).unwrap(), "\"SCANNING\"");
        assert_eq!(NetworkMode::AccessPoint.to_string(), "ACCESS_POINT");
        assert_eq!("client".parse::<NetworkMode>().unwrap(), NetworkMode::Client);
    }

    #[test]
    fn last_error_serializes_flat() {
        let err = LastError::new(
            BackendError::new(BackendErrorKind::ProcessFailed { exit_code: Some(2) }, "boom"),
            DateTime::from_timestamp(0, 0).unwrap(),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "PROCESS_FAILED");
        assert_eq!(json["exitCode"], 2);
        assert_eq!(json["message"], "boom");
    }
}
