mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use kntree_config::Config;
use kntree_core::ProcessExecutor;

use crate::cli::{Cli, ColorMode, Command, ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::Session;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Completions(args) = &cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "kntree", &mut std::io::stdout());
        return Ok(());
    }

    let path = cli.global.config.clone().unwrap_or_else(kntree_config::config_path);

    // Init must not read the file it may be replacing.
    if let Command::Config(ConfigArgs {
        command: ConfigCommand::Init { force },
    }) = &cli.command
    {
        let mut config = Config::default();
        apply_overrides(&cli.global, &mut config);
        return commands::config_cmd::init(&config, &path, *force);
    }

    let mut config = kntree_config::load_config_from(&path).map_err(|e| CliError::config(&path, e))?;
    apply_overrides(&cli.global, &mut config);

    if let Command::Config(args) = &cli.command {
        return commands::config_cmd::handle(args, &config, &path);
    }

    let runtime = config
        .to_runtime_config()
        .map_err(|e| CliError::config(&path, e))?;
    let color = color_enabled(cli.global.color, &config);
    let executor = Arc::new(ProcessExecutor::new(runtime.timeout));
    let session = Session::new(executor, &runtime, color);

    tracing::debug!(command = ?cli.command, kn = %runtime.kn_path.display(), "dispatching command");
    tokio::select! {
        result = commands::dispatch(cli.command, &session) => result,
        _ = tokio::signal::ctrl_c() => {
            session.shutdown();
            Err(CliError::Interrupted)
        }
    }
}

/// Command-line flags on top of the file and environment.
fn apply_overrides(global: &GlobalOpts, config: &mut Config) {
    if let Some(kn_path) = &global.kn_path {
        config.kn_path.clone_from(kn_path);
    }
    if let Some(namespace) = &global.namespace {
        config.namespace = Some(namespace.clone());
    }
    if let Some(timeout) = global.timeout {
        config.timeout_secs = timeout;
    }
}

/// An explicit `--color` wins; otherwise the config file decides.
fn color_enabled(flag: ColorMode, config: &Config) -> bool {
    let mode = match flag {
        ColorMode::Auto => ColorMode::from_str(&config.color, true).unwrap_or(ColorMode::Auto),
        explicit => explicit,
    };
    output::should_color(mode)
}
