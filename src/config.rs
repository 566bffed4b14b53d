//! Launcher configuration parsing, validation, and secret loading.
//!
//! The configuration is loaded once by the binary entry point and handed to
//! each component explicitly; nothing reads it through a global.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::{AppError, Result};

/// File name looked up in the working directory when `--config` is omitted.
pub const CONFIG_FILE_NAME: &str = "thiccpaper.toml";

/// Environment variable that overrides the configured RCON password.
pub const RCON_PASSWORD_ENV: &str = "THICCPAPER_RCON_PASSWORD";

/// RCON control-channel settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct RconConfig {
    /// Host the server's RCON listener is reached on.
    pub host: String,
    /// RCON port, also written to `rcon.port` before every start.
    pub port: u16,
    /// Shared secret, also written to `rcon.password` before every start.
    pub password: String,
    /// Upper bound for connect plus one request/response exchange.
    pub timeout_seconds: u64,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 25575,
            password: "thiccpaper".into(),
            timeout_seconds: 5,
        }
    }
}

impl RconConfig {
    /// Bound for one RCON exchange.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Startup supervision settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct StartupConfig {
    /// Substring the server prints to stdout once fully initialized.
    pub readiness_marker: String,
    /// Deadline for the readiness line; 0 is rejected.
    pub timeout_seconds: u64,
    /// Heap size used when `start` is given no argument.
    pub default_memory: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            readiness_marker: "For help, type \"help\"".into(),
            timeout_seconds: 180,
            default_memory: "2GB".into(),
        }
    }
}

/// Release download settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct ReleaseConfig {
    /// Base URL of the `PaperMC` downloads API (v2).
    pub api_base_url: String,
    /// API project name; also the release id prefix.
    pub project: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.papermc.io/v2".into(),
            project: "paper".into(),
        }
    }
}

fn default_installations_dir() -> PathBuf {
    PathBuf::from("paper-installations")
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("thiccpaper.json")
}

fn default_marker_path() -> PathBuf {
    PathBuf::from("server.lock")
}

fn default_java_bin() -> String {
    "java".into()
}

/// Launcher configuration parsed from `thiccpaper.toml`.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// working configuration rooted at the current directory.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LauncherConfig {
    /// Directory holding one sub-directory per installed release.
    #[serde(default = "default_installations_dir")]
    pub installations_dir: PathBuf,
    /// JSON file recording the selected and installed releases.
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    /// Liveness marker path, shared by all releases of this installation.
    #[serde(default = "default_marker_path")]
    pub marker_path: PathBuf,
    /// Java executable used to launch the server jar.
    #[serde(default = "default_java_bin")]
    pub java_bin: String,
    /// RCON control-channel settings.
    #[serde(default)]
    pub rcon: RconConfig,
    /// Startup supervision settings.
    #[serde(default)]
    pub startup: StartupConfig,
    /// Release download settings.
    #[serde(default)]
    pub release: ReleaseConfig,
}

impl LauncherConfig {
    /// Resolve the configuration for this invocation.
    ///
    /// An explicit path must exist. Without one, [`CONFIG_FILE_NAME`] in the
    /// current directory is used when present, otherwise the defaults rooted
    /// at the current directory. The RCON password env override is applied
    /// last.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, contains
    /// invalid TOML, or fails validation.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::load_from_path(path)?
        } else {
            let cwd = env::current_dir()
                .map_err(|err| AppError::Config(format!("cannot resolve current dir: {err}")))?;
            let candidate = cwd.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                Self::load_from_path(&candidate)?
            } else {
                debug!("no {CONFIG_FILE_NAME} found, using defaults");
                Self::from_toml_str("", &cwd)?
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file path.
    ///
    /// Relative paths inside the file resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_toml_str(&raw, &base)
    }

    /// Parse configuration from a TOML string and resolve relative paths
    /// against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.installations_dir = resolve(base_dir, &config.installations_dir);
        config.registry_path = resolve(base_dir, &config.registry_path);
        config.marker_path = resolve(base_dir, &config.marker_path);
        config.validate()?;
        Ok(config)
    }

    /// Replace the RCON password with [`RCON_PASSWORD_ENV`] when it is set
    /// and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var(RCON_PASSWORD_ENV) {
            if !value.is_empty() {
                debug!("rcon password taken from {RCON_PASSWORD_ENV}");
                self.rcon.password = value;
            }
        }
    }

    /// Working directory of the release `release_id`.
    #[must_use]
    pub fn release_dir(&self, release_id: &str) -> PathBuf {
        self.installations_dir.join(release_id)
    }

    /// Deadline for the readiness line after spawn.
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup.timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.rcon.port == 0 {
            return Err(AppError::Config("rcon.port must be greater than zero".into()));
        }
        if self.rcon.password.is_empty() {
            return Err(AppError::Config("rcon.password must not be empty".into()));
        }
        if self.rcon.timeout_seconds == 0 {
            return Err(AppError::Config(
                "rcon.timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.startup.timeout_seconds == 0 {
            return Err(AppError::Config(
                "startup.timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.startup.readiness_marker.trim().is_empty() {
            return Err(AppError::Config(
                "startup.readiness_marker must not be empty".into(),
            ));
        }
        if self.java_bin.trim().is_empty() {
            return Err(AppError::Config("java_bin must not be empty".into()));
        }
        if self.release.project.trim().is_empty() {
            return Err(AppError::Config("release.project must not be empty".into()));
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
