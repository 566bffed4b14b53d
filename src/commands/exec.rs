//! `exec <command...>`: run one console command over RCON.

use crate::config::LauncherConfig;
use crate::rcon::RconClient;
use crate::{AppError, Result};

/// Join `words` with spaces, send the command, and print the reply.
///
/// # Errors
///
/// - `AppError::InvalidInput` if the command is empty.
/// - Any error from [`RconClient::send`].
pub async fn execute(config: &LauncherConfig, words: &[String]) -> Result<()> {
    let command = words.join(" ");
    if command.trim().is_empty() {
        return Err(AppError::InvalidInput("no command given".into()));
    }

    let reply = RconClient::from_config(&config.rcon).send(&command).await?;
    if !reply.is_empty() {
        println!("{}", reply.trim_end());
    }
    Ok(())
}
