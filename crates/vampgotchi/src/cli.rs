//! Clap derive structures for the `vampgotchi` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use vampgotchi_core::{Ink, NetworkMode, ThemePreset};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vampgotchi -- BLE monitoring appliance with an e-paper pet
#[derive(Debug, Parser)]
#[command(
    name = "vampgotchi",
    version,
    about = "Run the vampgotchi BLE monitor or control a running one",
    long_about = "Runs the BLE monitoring coordinator, e-paper render loop and web console\n\
        (`vampgotchi run`), or drives a running console over HTTP.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "VAMPGOTCHI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Web console URL for remote commands
    #[arg(
        long,
        short = 'u',
        env = "VAMPGOTCHI_URL",
        default_value = "http://127.0.0.1",
        global = true
    )]
    pub url: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    pub timeout: u64,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the coordinator, render loop, auto-scan and web console
    Run(RunArgs),

    /// Show the appliance state
    #[command(alias = "st")]
    Status,

    /// List devices found by the last scan
    #[command(alias = "ls")]
    Devices,

    /// Start a BLE scan
    Scan(ScanArgs),

    /// Select the attack target
    Select {
        /// Device address (AA:BB:CC:DD:EE:FF)
        address: String,
    },

    /// Start an attack on the selected (or given) device
    Attack(AttackArgs),

    /// Stop the running scan or attack
    Stop,

    /// Switch the Wi-Fi network mode
    Network {
        mode: NetworkModeArg,
    },

    /// Change the display theme
    Theme(ThemeArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Listen address for the web console (overrides config)
    #[arg(long)]
    pub bind: Option<std::net::SocketAddr>,

    /// Write rendered frames to this PBM file (overrides config)
    #[arg(long)]
    pub frame_file: Option<PathBuf>,

    /// Disable periodic auto-scan
    #[arg(long)]
    pub no_auto_scan: bool,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Scan duration (e.g. 20s)
    #[arg(long, short = 't', value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Wait until the scan finishes
    #[arg(long, short = 'w')]
    pub wait: bool,
}

#[derive(Debug, Args)]
pub struct AttackArgs {
    /// Select this device first
    pub address: Option<String>,

    /// Attack duration (e.g. 10s)
    #[arg(long, short = 'd', value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Wait until the attack finishes
    #[arg(long, short = 'w')]
    pub wait: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NetworkModeArg {
    /// Host an access point
    #[value(alias = "access-point")]
    Ap,
    /// Join an existing network
    Client,
}

impl From<NetworkModeArg> for NetworkMode {
    fn from(arg: NetworkModeArg) -> Self {
        match arg {
            NetworkModeArg::Ap => Self::AccessPoint,
            NetworkModeArg::Client => Self::Client,
        }
    }
}

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("theme")
        .required(true)
        .args(["preset", "foreground"])
))]
pub struct ThemeArgs {
    /// Named preset
    #[arg(value_enum)]
    pub preset: Option<PresetArg>,

    /// Foreground ink (with --background)
    #[arg(long, value_enum, requires = "background", conflicts_with = "preset")]
    pub foreground: Option<InkArg>,

    /// Background ink (with --foreground)
    #[arg(long, value_enum, requires = "foreground")]
    pub background: Option<InkArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    /// Black ink on white
    Black,
    /// White ink on black
    White,
}

impl From<PresetArg> for ThemePreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Black => Self::Black,
            PresetArg::White => Self::White,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InkArg {
    Black,
    White,
}

impl From<InkArg> for Ink {
    fn from(arg: InkArg) -> Self {
        match arg {
            InkArg::Black => Self::Black,
            InkArg::White => Self::White,
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration (file + env + defaults)
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
