//! Output formatting: table, JSON, YAML.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use vampgotchi_core::{DeviceRecord, Mode, Mood, SystemState};

use crate::api::StatusReport;
use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_mode(mode: Mode, color: bool) -> String {
    let label = mode.to_string();
    if !color {
        return label;
    }
    match mode {
        Mode::Idle => label.green().to_string(),
        Mode::Scanning => label.cyan().to_string(),
        Mode::Attacking => label.magenta().bold().to_string(),
        Mode::Error => label.red().bold().to_string(),
    }
}

fn paint_mood(mood: Mood, color: bool) -> String {
    let label = mood.to_string();
    if !color {
        return label;
    }
    match mood {
        Mood::Happy | Mood::Excited => label.yellow().to_string(),
        Mood::Sad => label.blue().to_string(),
        Mood::Angry => label.red().to_string(),
        Mood::Bored => label.dimmed().to_string(),
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "")]
    selected: &'static str,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "RSSI")]
    rssi: String,
    #[tabled(rename = "Last seen")]
    last_seen: String,
}

fn device_row(device: &DeviceRecord, state: &SystemState) -> DeviceRow {
    let selected = state.selected_target.as_ref() == Some(&device.address);
    DeviceRow {
        selected: if selected { "*" } else { "" },
        address: device.address.to_string(),
        name: device.label().to_owned(),
        rssi: format!("{} dBm", device.signal_strength),
        last_seen: device.last_seen.format("%H:%M:%S").to_string(),
    }
}

#[derive(Tabled)]
struct KeyValue {
    #[tabled(rename = "Field")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render the `status` command.
pub fn render_status(
    format: OutputFormat,
    report: &StatusReport,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(status_table(report, color)),
        _ => render_structured(format, report),
    }
}

/// Render the device list of a snapshot.
pub fn render_devices(format: OutputFormat, state: &SystemState) -> Result<String, CliError> {
    match format {
        OutputFormat::Table if state.devices.is_empty() => Ok("No devices found".to_owned()),
        OutputFormat::Table => {
            let rows: Vec<DeviceRow> = state.devices.iter().map(|d| device_row(d, state)).collect();
            Ok(render_table(&rows))
        }
        _ => render_structured(format, &state.devices),
    }
}

/// One-line acknowledgement after a command, or the snapshot itself.
pub fn render_ack(
    format: OutputFormat,
    state: &SystemState,
    message: &str,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(format!(
            "{message} (mode {}, mood {})",
            paint_mode(state.mode, color),
            paint_mood(state.mood, color)
        )),
        _ => render_structured(format, state),
    }
}

/// JSON or YAML for any serializable value. Table format falls back to
/// pretty JSON.
pub fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table | OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn status_table(report: &StatusReport, color: bool) -> String {
    let state = &report.state;
    let vitals = &state.vitals;
    let target = state
        .selected_device()
        .map_or_else(|| "-".to_owned(), |d| format!("{} ({})", d.label(), d.address));
    let last_error = state
        .last_error
        .as_ref()
        .map_or_else(|| "-".to_owned(), |e| format!("{}: {}", e.kind.code(), e.message));

    let rows = vec![
        KeyValue { key: "Mode", value: paint_mode(state.mode, color) },
        KeyValue { key: "Mood", value: paint_mood(state.mood, color) },
        KeyValue { key: "Devices", value: state.devices.len().to_string() },
        KeyValue { key: "Target", value: target },
        KeyValue {
            key: "Scans / attacks",
            value: format!("{} / {}", state.counters.total_scans, state.counters.total_attacks),
        },
        KeyValue { key: "Network", value: format!("{} {}", state.network_mode, report.ip) },
        KeyValue { key: "Uptime", value: report.uptime.clone() },
        KeyValue {
            key: "Vitals",
            value: format!(
                "hunger {}% blood {}% level {} exp {}/{} money {}",
                vitals.hunger_percent(),
                vitals.blood,
                vitals.level,
                vitals.exp,
                vitals.exp_to_next,
                vitals.money
            ),
        },
        KeyValue { key: "Last error", value: last_error },
    ];
    render_table(&rows)
}
