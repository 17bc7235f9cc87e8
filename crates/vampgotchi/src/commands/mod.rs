//! Command dispatch: bridges CLI args -> console requests -> output formatting.

pub mod config_cmd;
pub mod remote;
pub mod run;

use std::path::PathBuf;

use crate::cli::{Command, GlobalOpts};
use crate::client::ConsoleClient;
use crate::error::CliError;

/// `--config`, or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(vampgotchi_config::config_path)
}

/// Dispatch a console-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    client: &ConsoleClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => remote::status(client, global).await,
        Command::Devices => remote::devices(client, global).await,
        Command::Scan(args) => remote::scan(client, &args, global).await,
        Command::Select { address } => remote::select(client, &address, global).await,
        Command::Attack(args) => remote::attack(client, args, global).await,
        Command::Stop => remote::stop(client, global).await,
        Command::Network { mode } => remote::network(client, mode.into(), global).await,
        Command::Theme(args) => remote::theme(client, &args, global).await,
        // Run, Config and Completions are handled before dispatch
        Command::Run(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
