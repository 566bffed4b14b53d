//! Command-line surface of the `thiccpaper` binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

/// Log output format, selected with `--log-format`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(
    name = "thiccpaper",
    about = "Install, start, and stop a PaperMC server",
    version,
    long_about = None
)]
pub struct Cli {
    /// Path to the TOML configuration file (default: ./thiccpaper.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Command to run; prints help when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Launcher commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start the selected release and wait until it is ready (e.g. `start 4GB`).
    Start {
        /// Heap size as <n>GB or <n>MB; defaults to the configured size.
        size: Option<String>,
    },

    /// Ask the running server to shut down over RCON.
    Stop,

    /// Download the newest build of a Minecraft version (e.g. `install-version 1.20.4`).
    InstallVersion {
        /// Minecraft version.
        version: String,
    },

    /// Select an installed release (e.g. `set-version paper-1.20.4-496`).
    SetVersion {
        /// Release id as listed by `versions`.
        release: String,
    },

    /// Send a console command over RCON and print the reply (e.g. `exec say hi`).
    Exec {
        /// Command words, joined with spaces.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// List installed releases; the selected one is marked with `*`.
    Versions,
}

impl Command {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop => "stop",
            Self::InstallVersion { .. } => "install-version",
            Self::SetVersion { .. } => "set-version",
            Self::Exec { .. } => "exec",
            Self::Versions => "versions",
        }
    }
}

/// Print a parse error (or the `--help` / `--version` text clap reports the
/// same way) and map it to the process exit code.
#[must_use]
pub fn report_parse_error(err: &clap::Error) -> ExitCode {
    if err.print().is_err() {
        eprintln!("{err}");
    }
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
