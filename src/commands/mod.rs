//! Command handlers.
//!
//! Each CLI command maps to one handler module at compile time. Handlers
//! print their result to stdout and return errors to the dispatcher, which
//! logs them once.

pub mod exec;
pub mod install_version;
pub mod set_version;
pub mod start;
pub mod stop;
pub mod versions;

use tracing::{error, info_span, Instrument};

use crate::cli::Command;
use crate::config::LauncherConfig;
use crate::Result;

/// Run `command` against `config`.
///
/// # Errors
///
/// Returns the handler's error after logging it.
pub async fn dispatch(command: Command, config: &LauncherConfig) -> Result<()> {
    let name = command.name();
    let result = async {
        match command {
            Command::Start { size } => start::execute(config, size.as_deref()).await,
            Command::Stop => stop::execute(config).await,
            Command::InstallVersion { version } => {
                install_version::execute(config, &version).await
            }
            Command::SetVersion { release } => set_version::execute(config, &release),
            Command::Exec { words } => exec::execute(config, &words).await,
            Command::Versions => versions::execute(config),
        }
    }
    .instrument(info_span!("command", name))
    .await;

    if let Err(ref err) = result {
        error!(command = name, %err, "command failed");
    }
    result
}
