//! Layout of one installed release.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::persist::write_atomic;
use crate::properties;
use crate::{AppError, Result};

/// Extension of the server artifact.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// License-acceptance file name.
pub const EULA_FILE: &str = "eula.txt";

/// Server configuration file name.
pub const PROPERTIES_FILE: &str = "server.properties";

/// Directory of one installed release: `<installations>/<release-id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    release_id: String,
    root: PathBuf,
}

impl WorkingDirectory {
    /// Locate the directory for `release_id` under `installations_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if `release_id` is empty or is not a
    /// single plain path component.
    pub fn new(installations_dir: &Path, release_id: &str) -> Result<Self> {
        validate_release_id(release_id)?;
        Ok(Self {
            release_id: release_id.to_owned(),
            root: installations_dir.join(release_id),
        })
    }

    /// Release identifier.
    #[must_use]
    pub fn release_id(&self) -> &str {
        &self.release_id
    }

    /// Directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the directory exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// `<root>/<release-id>.jar`.
    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.root.join(format!("{}.{ARTIFACT_EXTENSION}", self.release_id))
    }

    /// `<root>/eula.txt`.
    #[must_use]
    pub fn eula_path(&self) -> PathBuf {
        self.root.join(EULA_FILE)
    }

    /// `<root>/server.properties`.
    #[must_use]
    pub fn properties_path(&self) -> PathBuf {
        self.root.join(PROPERTIES_FILE)
    }

    /// Make sure `eula.txt` says `eula=true`.
    ///
    /// A missing file is created; an existing one is patched in place so its
    /// comment header survives. Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read or written.
    pub fn accept_eula(&self) -> Result<bool> {
        let path = self.eula_path();
        if !path.exists() {
            write_atomic(&path, b"eula=true\n")?;
            info!(path = %path.display(), "created eula.txt");
            return Ok(true);
        }

        if properties::get_property(&path, "eula")?.as_deref() == Some("true") {
            return Ok(false);
        }
        properties::set_property(&path, "eula", "true")?;
        info!(path = %path.display(), "accepted eula");
        Ok(true)
    }
}

/// Reject ids that would escape the installations directory.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` for empty ids, `.`/`..`, or ids
/// containing path separators.
pub fn validate_release_id(release_id: &str) -> Result<()> {
    let trimmed = release_id.trim();
    if trimmed.is_empty()
        || trimmed != release_id
        || matches!(release_id, "." | "..")
        || release_id.contains(['/', '\\', '\0'])
    {
        return Err(AppError::InvalidInput(format!("invalid release id '{release_id}'")));
    }
    Ok(())
}
