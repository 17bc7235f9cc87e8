//! Config subcommand handlers.

use vampgotchi_config::{Config, load_config_from, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = super::config_file(global);
    match args.command {
        ConfigCommand::Show => {
            let config = load_config_from(&path)?;
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&config)?,
                format => output::render_structured(format, &config)?,
            };
            output::print_output(out.trim_end(), global.quiet);
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            save_config(&Config::default(), &path)?;
            output::print_output(
                &format!("Wrote default configuration to {}", path.display()),
                global.quiet,
            );
        }
    }
    Ok(())
}
