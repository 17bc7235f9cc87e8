//! Configuration for the vampgotchi appliance.
//!
//! A TOML file layered over built-in defaults and `VAMPGOTCHI_*` environment
//! variables, plus translation into the runtime configs the other crates
//! take (`CoordinatorConfig`, `ToolConfig`). The web console writes theme
//! and network changes back through [`save_config`].

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vampgotchi_ble::ToolConfig;
use vampgotchi_core::{CoordinatorConfig, NetworkMode, Theme, ThemePreset};

/// Environment variable prefix; nested keys use `__` (`VAMPGOTCHI_WEB__BIND`).
pub const ENV_PREFIX: &str = "VAMPGOTCHI_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub web: WebConfig,

    /// Forces debug-level logging.
    #[serde(default)]
    pub debug_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// `"black"` (black ink on white) or `"white"`.
    #[serde(default = "default_theme")]
    pub theme: ThemePreset,

    /// Every Nth render is a full refresh.
    #[serde(default = "default_full_refresh_interval")]
    pub full_refresh_interval: u32,

    /// Seconds between renders.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Write each frame to this path as a PBM image.
    pub frame_file: Option<PathBuf>,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            full_refresh_interval: default_full_refresh_interval(),
            refresh_secs: default_refresh_secs(),
            frame_file: None,
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_theme() -> ThemePreset {
    ThemePreset::Black
}
fn default_full_refresh_interval() -> u32 {
    30
}
fn default_refresh_secs() -> u64 {
    3
}
fn default_width() -> u32 {
    250
}
fn default_height() -> u32 {
    122
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Mode reported at startup when it cannot be inferred from the IP.
    #[serde(default)]
    pub mode: NetworkMode,

    #[serde(default = "default_ap_ssid")]
    pub ap_ssid: String,

    /// Address the appliance takes in access-point mode.
    #[serde(default = "default_ap_ip")]
    pub ap_ip: Ipv4Addr,

    /// Program + args run when switching to access-point mode.
    pub ap_command: Option<Vec<String>>,

    /// Program + args run when switching to client mode.
    pub client_command: Option<Vec<String>>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::default(),
            ap_ssid: default_ap_ssid(),
            ap_ip: default_ap_ip(),
            ap_command: None,
            client_command: None,
        }
    }
}

fn default_ap_ssid() -> String {
    "VampGotchi".into()
}
fn default_ap_ip() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 4, 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// BLEeding checkout directory.
    #[serde(default = "default_bleeding_path")]
    pub bleeding_path: PathBuf,

    #[serde(default = "default_python")]
    pub python: PathBuf,

    /// Script inside `bleeding_path`.
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Seconds.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout: u64,

    /// Seconds.
    #[serde(default = "default_attack_timeout")]
    pub attack_timeout: u64,

    /// Seconds shaved off the timeout handed to the tool, so it stops on
    /// its own before the hard kill.
    #[serde(default = "default_stop_margin_secs")]
    pub stop_margin_secs: u64,

    /// Program + args whose output `/api/debug/bluetooth` shows.
    #[serde(default = "default_adapter_status_command")]
    pub adapter_status_command: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            bleeding_path: default_bleeding_path(),
            python: default_python(),
            script: default_script(),
            scan_timeout: default_scan_timeout(),
            attack_timeout: default_attack_timeout(),
            stop_margin_secs: default_stop_margin_secs(),
            adapter_status_command: default_adapter_status_command(),
        }
    }
}

fn default_bleeding_path() -> PathBuf {
    PathBuf::from("/root/BLEeding")
}
fn default_python() -> PathBuf {
    PathBuf::from("python3")
}
fn default_script() -> PathBuf {
    PathBuf::from("bleeding.py")
}
fn default_scan_timeout() -> u64 {
    20
}
fn default_attack_timeout() -> u64 {
    10
}
fn default_stop_margin_secs() -> u64 {
    1
}
fn default_adapter_status_command() -> Vec<String> {
    vec!["hciconfig".into()]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Seconds between automatic scans; 0 disables auto-scan.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    #[serde(default = "default_idle_ticks_before_bored")]
    pub idle_ticks_before_bored: u32,

    /// Heartbeat period in seconds.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Keep devices missing from a scan for this many seconds.
    /// Unset: each scan replaces the list.
    pub device_retention_secs: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            idle_ticks_before_bored: default_idle_ticks_before_bored(),
            tick_secs: default_tick_secs(),
            device_retention_secs: None,
        }
    }
}

fn default_scan_interval() -> u64 {
    60
}
fn default_idle_ticks_before_bored() -> u32 {
    10
}
fn default_tick_secs() -> u64 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 80))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "vampgotchi", "vampgotchi").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vampgotchi");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack: defaults, then the TOML file at `path`, then env.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
}

/// Load and validate the config at `path` (a missing file means defaults).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

/// Load from `path` if given, otherwise from [`config_path()`].
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config_from(&config_path()),
    }
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent dirs.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.full_refresh_interval == 0 {
            return Err(invalid("display.full_refresh_interval", "must be at least 1"));
        }
        if self.display.refresh_secs == 0 {
            return Err(invalid("display.refresh_secs", "must be at least 1"));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(invalid("display.width/height", "must be non-zero"));
        }
        if self.backend.scan_timeout == 0 {
            return Err(invalid("backend.scan_timeout", "must be at least 1 second"));
        }
        if self.backend.adapter_status_command.is_empty() {
            return Err(invalid("backend.adapter_status_command", "must name a program"));
        }
        for (field, cmd) in [
            ("network.ap_command", &self.network.ap_command),
            ("network.client_command", &self.network.client_command),
        ] {
            if cmd.as_ref().is_some_and(Vec::is_empty) {
                return Err(invalid(field, "must name a program"));
            }
        }
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        Theme::preset(self.display.theme)
    }

    /// Record a theme chosen at runtime. Themes that match no preset are
    /// not representable in the file and leave it unchanged.
    pub fn set_theme(&mut self, theme: Theme) {
        if let Some(preset) = theme.preset_name() {
            self.display.theme = preset;
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let monitor = &self.monitor;
        CoordinatorConfig {
            scan_timeout: Duration::from_secs(self.backend.scan_timeout),
            attack_duration: Duration::from_secs(self.backend.attack_timeout),
            scan_interval: Duration::from_secs(monitor.scan_interval),
            tick: Duration::from_secs(monitor.tick_secs),
            idle_ticks_before_bored: monitor.idle_ticks_before_bored,
            device_retention: monitor.device_retention_secs.map(Duration::from_secs),
            network_mode: self.network.mode,
            theme: self.theme(),
        }
    }

    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            interpreter: self.backend.python.clone(),
            script: self.backend.script.clone(),
            working_dir: self.backend.bleeding_path.clone(),
            stop_margin: Duration::from_secs(self.backend.stop_margin_secs),
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}
