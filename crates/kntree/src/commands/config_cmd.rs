//! Config subcommand handlers. These never touch the cluster.

use std::path::Path;

use kntree_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, config: &Config, path: &Path) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => return init(config, path, force),
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(config).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            })?;
            output::print_output(rendered.trim_end());
        }
        ConfigCommand::Path => output::print_output(&path.display().to_string()),
    }
    Ok(())
}

/// Write `config` to `path`. An existing file is only replaced with `force`.
pub fn init(config: &Config, path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Validation {
            field: "config".into(),
            reason: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }
    kntree_config::save_config_to(config, path).map_err(|e| CliError::config(path, e))?;
    output::print_output(&output::done(&format!("Wrote {}", path.display()), false));
    Ok(())
}
