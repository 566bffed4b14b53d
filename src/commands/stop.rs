//! `stop`: shut the server down over RCON.

use crate::config::LauncherConfig;
use crate::supervisor::Supervisor;
use crate::Result;

/// Clear the liveness marker and send the shutdown command.
///
/// # Errors
///
/// Any error from [`Supervisor::stop`].
pub async fn execute(config: &LauncherConfig) -> Result<()> {
    let report = Supervisor::from_config(config).stop().await?;
    match report.reply {
        Some(reply) if !reply.trim().is_empty() => println!("Server stopping: {}", reply.trim()),
        Some(_) => println!("Server stopping."),
        None => println!("Server was not reachable; marker cleared."),
    }
    Ok(())
}
