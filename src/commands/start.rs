//! `start [size]`: launch the selected release and wait for readiness.

use crate::config::LauncherConfig;
use crate::registry::VersionRegistry;
use crate::supervisor::{MemorySize, Supervisor, WorkingDirectory};
use crate::Result;

/// Start the current release with `size` (or the configured default) heap.
///
/// # Errors
///
/// - `AppError::InvalidInput` for a malformed size.
/// - `AppError::NotFound` if no release is selected.
/// - Any error from [`Supervisor::start`].
pub async fn execute(config: &LauncherConfig, size: Option<&str>) -> Result<()> {
    let heap: MemorySize = size.unwrap_or(config.startup.default_memory.as_str()).parse()?;
    let release = VersionRegistry::new(&config.registry_path).current()?;
    let workdir = WorkingDirectory::new(&config.installations_dir, &release)?;

    let process = Supervisor::from_config(config).start(&workdir, heap).await?;
    match process.pid {
        Some(pid) => println!(
            "Server {} is running with {} heap (pid {pid}).",
            process.release_id, process.heap
        ),
        None => println!(
            "Server {} is running with {} heap.",
            process.release_id, process.heap
        ),
    }
    Ok(())
}
