//! `versions`: list installed releases.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::LauncherConfig;
use crate::registry::{InstalledRelease, VersionRegistry};
use crate::{AppError, Result};

/// One row of the `versions` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseListing {
    /// Release id (directory name).
    pub id: String,
    /// Whether `start` launches this release.
    pub current: bool,
    /// Registry metadata; `None` for directories added by hand.
    pub details: Option<InstalledRelease>,
}

/// Releases present under the installations directory, sorted by id.
///
/// # Errors
///
/// Returns `AppError::Io` if the directory or registry cannot be read.
pub fn list(config: &LauncherConfig) -> Result<Vec<ReleaseListing>> {
    let registry = VersionRegistry::new(&config.registry_path).load()?;
    let mut ids = release_dirs(&config.installations_dir)?;
    ids.sort();

    Ok(ids
        .into_iter()
        .map(|id| ReleaseListing {
            current: registry.current_version.as_deref() == Some(id.as_str()),
            details: registry.find(&id).cloned(),
            id,
        })
        .collect())
}

/// Print the listing.
///
/// # Errors
///
/// See [`list`].
pub fn execute(config: &LauncherConfig) -> Result<()> {
    let releases = list(config)?;
    if releases.is_empty() {
        println!("No releases installed; run install-version <version>.");
        return Ok(());
    }

    for release in releases {
        let mark = if release.current { '*' } else { ' ' };
        match release.details {
            Some(details) => println!(
                "{mark} {} (minecraft {}, build {}, installed {})",
                release.id,
                details.minecraft_version,
                details.build,
                details.installed_at.format("%Y-%m-%d %H:%M UTC")
            ),
            None => println!("{mark} {}", release.id),
        }
    }
    Ok(())
}

fn release_dirs(installations_dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(installations_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(AppError::Io(format!(
                "failed to list {}: {err}",
                installations_dir.display()
            )))
        }
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| AppError::Io(format!("failed to list releases: {err}")))?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                ids.push(name.to_owned());
            }
        }
    }
    Ok(ids)
}
