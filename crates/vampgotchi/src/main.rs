//! `vampgotchi`: BLE monitoring appliance with an e-paper pet.
//!
//! `vampgotchi run` hosts the coordinator, the render loop, auto-scan and
//! the web console. Every other subcommand is a thin HTTP client for a
//! running console.

mod api;
mod cli;
mod client;
mod commands;
mod error;
mod net;
mod output;
mod web;

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::client::ConsoleClient;
use crate::error::CliError;

/// Crates whose events the verbosity flags control; everything else stays at `warn`.
const LOG_TARGETS: &[&str] = &[
    "vampgotchi",
    "vampgotchi_ble",
    "vampgotchi_core",
    "vampgotchi_config",
    "vampgotchi_display",
];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // The daemon reads its config first so `debug_mode` can raise the log level
        Command::Run(args) => {
            let path = commands::config_file(&cli.global);
            let config = vampgotchi_config::load_config_from(&path)?;
            let _guard = init_tracing(&cli.global, 1 + u8::from(config.debug_mode))?;
            commands::run::handle(args, config, path).await
        }

        Command::Config(args) => {
            let _guard = init_tracing(&cli.global, 0)?;
            commands::config_cmd::handle(&args, &cli.global)
        }

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "vampgotchi", &mut std::io::stdout());
            Ok(())
        }

        // All other commands talk to a running console
        cmd => {
            let _guard = init_tracing(&cli.global, 0)?;
            let client =
                ConsoleClient::new(&cli.global.url, Duration::from_secs(cli.global.timeout))?;
            tracing::debug!(command = ?cmd, url = %client.base_url(), "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

/// `warn` at `-v` count 0, raised by `boost` (the daemon logs at `info`,
/// or `debug` with `debug_mode`). `RUST_LOG` wins when set.
fn log_level(verbose: u8, boost: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose.saturating_add(boost) {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter_directive(level: &str) -> String {
    let mut directive = String::from("warn");
    for target in LOG_TARGETS {
        directive.push(',');
        directive.push_str(target);
        directive.push('=');
        directive.push_str(level);
    }
    directive
}

/// Log to stderr, or to `--log-file` through a non-blocking writer. The
/// returned guard must live until exit so buffered lines are flushed.
fn init_tracing(global: &GlobalOpts, boost: u8) -> Result<Option<WorkerGuard>, CliError> {
    let level = log_level(global.verbose, boost, global.quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let Some(log_file) = &global.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let log_dir = log_file.parent().unwrap_or(Path::new("."));
    let log_name = log_file
        .file_name()
        .ok_or_else(|| CliError::Validation {
            field: "log-file".into(),
            reason: format!("{} has no file name", log_file.display()),
        })?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_name.to_string_lossy())
        .build(log_dir)
        .map_err(|e| CliError::Validation {
            field: "log-file".into(),
            reason: e.to_string(),
        })?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(Some(guard))
}
