#![forbid(unsafe_code)]

//! `thiccpaper`: `PaperMC` server launcher binary.
//!
//! Parses the command line, loads the configuration once, and hands both to
//! the command dispatcher on a current-thread tokio runtime.

use std::path::Path;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

use thiccpaper::cli::{report_parse_error, Cli, Command, LogFormat};
use thiccpaper::{commands, AppError, LauncherConfig, Result};

fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => return report_parse_error(&err),
    };

    let Some(command) = args.command else {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("failed to print help: {err}");
                ExitCode::FAILURE
            }
        };
    };

    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(command, args.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn run(command: Command, config_path: Option<&Path>) -> Result<()> {
    let config = LauncherConfig::discover(config_path).inspect_err(|err| {
        error!(%err, "failed to load configuration");
    })?;
    debug!(
        installations = %config.installations_dir.display(),
        registry = %config.registry_path.display(),
        "configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))
        .inspect_err(|err| error!(%err, "startup failed"))?;
    runtime.block_on(commands::dispatch(command, &config))
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
