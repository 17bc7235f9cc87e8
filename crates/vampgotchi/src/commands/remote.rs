//! Handlers for commands that drive a running console.

use vampgotchi_core::NetworkMode;

use crate::api::{AttackRequest, ScanRequest, ThemeRequest};
use crate::cli::{AttackArgs, GlobalOpts, ScanArgs, ThemeArgs};
use crate::client::ConsoleClient;
use crate::error::CliError;
use crate::output;

fn color(global: &GlobalOpts) -> bool {
    output::should_color(global.color)
}

pub async fn status(client: &ConsoleClient, global: &GlobalOpts) -> Result<(), CliError> {
    let report = client.status().await?;
    let out = output::render_status(global.output, &report, color(global))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn devices(client: &ConsoleClient, global: &GlobalOpts) -> Result<(), CliError> {
    let report = client.status().await?;
    let out = output::render_devices(global.output, &report.state)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn scan(
    client: &ConsoleClient,
    args: &ScanArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let request = ScanRequest {
        timeout: args.timeout.map(|t| t.as_secs().max(1)),
    };
    let state = client.scan(&request, args.wait).await?;
    let message = if args.wait {
        format!("Scan finished: {} device(s)", state.devices.len())
    } else {
        "Scan started".to_owned()
    };
    let out = output::render_ack(global.output, &state, &message, color(global))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn select(
    client: &ConsoleClient,
    address: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = client.select(address).await?;
    let label = state
        .selected_device()
        .map_or_else(|| address.to_owned(), |d| format!("{} ({})", d.label(), d.address));
    let out = output::render_ack(
        global.output,
        &state,
        &format!("Target set to {label}"),
        color(global),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn attack(
    client: &ConsoleClient,
    args: AttackArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let request = AttackRequest {
        address: args.address,
        duration: args.duration.map(|d| d.as_secs().max(1)),
    };
    let state = client.attack(&request, args.wait).await?;
    let message = if args.wait {
        "Attack finished"
    } else {
        "Attack started"
    };
    let out = output::render_ack(global.output, &state, message, color(global))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn stop(client: &ConsoleClient, global: &GlobalOpts) -> Result<(), CliError> {
    let state = client.stop().await?;
    let out = output::render_ack(global.output, &state, "Stopped", color(global))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn network(
    client: &ConsoleClient,
    mode: NetworkMode,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = client.network(mode).await?;
    let out = output::render_ack(
        global.output,
        &state,
        &format!("Network mode {}", state.network_mode),
        color(global),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn theme(
    client: &ConsoleClient,
    args: &ThemeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let request = ThemeRequest {
        preset: args.preset.map(Into::into),
        foreground: args.foreground.map(Into::into),
        background: args.background.map(Into::into),
    };
    let state = client.theme(&request).await?;
    let name = state
        .theme
        .preset_name()
        .map_or_else(|| "custom".to_owned(), |p| p.to_string());
    let out = output::render_ack(
        global.output,
        &state,
        &format!("Theme {name}"),
        color(global),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
