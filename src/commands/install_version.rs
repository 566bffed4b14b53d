//! `install-version <version>`: download a release and select it.

use crate::config::LauncherConfig;
use crate::installer::ReleaseInstaller;
use crate::registry::VersionRegistry;
use crate::Result;

/// Install the newest build of `minecraft_version` and make it current.
///
/// # Errors
///
/// Any error from [`ReleaseInstaller::install`] or the registry update.
pub async fn execute(config: &LauncherConfig, minecraft_version: &str) -> Result<()> {
    let release = ReleaseInstaller::from_config(config)?
        .install(minecraft_version)
        .await?;
    let id = release.id.clone();
    VersionRegistry::new(&config.registry_path).record_install(release)?;
    println!("Installed {id} and set it as the current version.");
    Ok(())
}
