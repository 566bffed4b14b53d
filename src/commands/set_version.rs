//! `set-version <release>`: select an installed release.

use crate::config::LauncherConfig;
use crate::registry::VersionRegistry;
use crate::supervisor::WorkingDirectory;
use crate::{AppError, Result};

/// Make `release` the release `start` launches.
///
/// # Errors
///
/// - `AppError::InvalidInput` for a malformed id.
/// - `AppError::NotFound` if no such release directory exists.
/// - `AppError::Io` if the registry cannot be written.
pub fn execute(config: &LauncherConfig, release: &str) -> Result<()> {
    let workdir = WorkingDirectory::new(&config.installations_dir, release)?;
    if !workdir.exists() {
        return Err(AppError::NotFound(format!(
            "release {release} not found in {}",
            config.installations_dir.display()
        )));
    }

    VersionRegistry::new(&config.registry_path).set_current(release)?;
    println!("Current version set to {release}.");
    Ok(())
}
