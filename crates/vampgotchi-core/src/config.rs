// ── Runtime coordinator configuration ──
//
// Tuning for the coordinator and its background tasks. Never touches disk;
// the binary builds one from `vampgotchi-config` and hands it in.

use std::time::Duration;

use crate::model::{NetworkMode, Theme};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Default for `StartScan { timeout: None }`.
    pub scan_timeout: Duration,
    /// Default for `StartAttack { duration: None }`.
    pub attack_duration: Duration,
    /// Auto-scan period. `Duration::ZERO` disables auto-scan.
    pub scan_interval: Duration,
    /// Heartbeat period. `Duration::ZERO` disables the heartbeat.
    pub tick: Duration,
    /// Idle heartbeats before an upbeat mood fades to bored.
    pub idle_ticks_before_bored: u32,
    /// `None`: each scan replaces the device list.
    pub device_retention: Option<Duration>,
    pub network_mode: NetworkMode,
    pub theme: Theme,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(20),
            attack_duration: Duration::from_secs(10),
            scan_interval: Duration::from_secs(60),
            tick: Duration::from_secs(3),
            idle_ticks_before_bored: 10,
            device_retention: None,
            network_mode: NetworkMode::default(),
            theme: Theme::default(),
        }
    }
}
