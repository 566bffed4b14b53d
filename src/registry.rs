//! Installed-release registry.
//!
//! A small JSON document next to the installations directory records which
//! releases are installed and which one `start` uses. Every save replaces the
//! file atomically.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::persist::write_atomic;
use crate::supervisor::workdir::validate_release_id;
use crate::{AppError, Result};

/// One installed release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InstalledRelease {
    /// Release identifier, e.g. `paper-1.20.4-496`.
    pub id: String,
    /// Minecraft version the build targets.
    pub minecraft_version: String,
    /// `PaperMC` build number.
    pub build: u32,
    /// When the release was installed.
    pub installed_at: DateTime<Utc>,
}

/// Registry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Registry {
    /// Release `start` launches; `None` until one is selected.
    #[serde(default)]
    pub current_version: Option<String>,
    /// Installed releases in install order.
    #[serde(default)]
    pub installed: Vec<InstalledRelease>,
}

impl Registry {
    /// Look up an installed release by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&InstalledRelease> {
        self.installed.iter().find(|release| release.id == id)
    }
}

/// File-backed [`Registry`].
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    path: PathBuf,
}

impl VersionRegistry {
    /// Registry stored at `path`. Touches nothing on disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry; a missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read or is not valid JSON.
    pub fn load(&self) -> Result<Registry> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no registry yet");
                Ok(Registry::default())
            }
            Err(err) => Err(AppError::Io(format!(
                "failed to read registry {}: {err}",
                self.path.display()
            ))),
        }
    }

    /// Replace the registry file with `registry`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if serialization or the write fails.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        let mut body = serde_json::to_vec_pretty(registry)?;
        body.push(b'\n');
        write_atomic(&self.path, &body)?;
        Ok(())
    }

    /// Id of the selected release.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if no release is selected.
    /// - `AppError::Io` if the registry cannot be read.
    pub fn current(&self) -> Result<String> {
        self.load()?.current_version.ok_or_else(|| {
            AppError::NotFound(
                "no server version selected; run install-version or set-version first".into(),
            )
        })
    }

    /// Select release `id`. The caller checks that it is installed; ids
    /// without an `installed` entry (copied in by hand) are accepted.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidInput` if `id` is not a valid release id.
    /// - `AppError::Io` on read/write failure.
    pub fn set_current(&self, id: &str) -> Result<()> {
        validate_release_id(id)?;
        let mut registry = self.load()?;
        registry.current_version = Some(id.to_owned());
        self.save(&registry)?;
        info!(release = id, "current version set");
        Ok(())
    }

    /// Add `release` (replacing an entry with the same id) and select it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on read/write failure.
    pub fn record_install(&self, release: InstalledRelease) -> Result<()> {
        let mut registry = self.load()?;
        let id = release.id.clone();
        match registry.installed.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = release,
            None => registry.installed.push(release),
        }
        registry.current_version = Some(id.clone());
        self.save(&registry)?;
        info!(release = %id, "release recorded and selected");
        Ok(())
    }
}
