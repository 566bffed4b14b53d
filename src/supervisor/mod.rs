//! Process supervisor for the Paper server.
//!
//! [`Supervisor::start`] checks the start preconditions, patches the release's
//! configuration, claims the liveness marker, spawns the JVM, and watches its
//! output until the server reports readiness. The launcher owns the startup
//! phase only: once ready, the child keeps running in its own process group
//! and the launcher returns. [`Supervisor::stop`] clears the marker and asks
//! the server to shut down over RCON.

pub mod lifecycle;
pub mod memory;
pub mod watch;
pub mod workdir;

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::{LauncherConfig, RconConfig};
use crate::marker::LivenessMarker;
use crate::properties;
use crate::rcon::RconClient;
use crate::{AppError, Result};

pub use lifecycle::{Lifecycle, ServerState};
pub use memory::MemorySize;
pub use watch::{
    forward_stderr, watch_startup, OutputCleaner, OutputCodec, OutputLine, StartupOutcome,
};
pub use workdir::WorkingDirectory;

/// RCON command that shuts the server down.
pub const SHUTDOWN_COMMAND: &str = "stop";

/// Windows `CREATE_NEW_PROCESS_GROUP` creation flag.
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Server that reached readiness and was handed off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisedProcess {
    /// Release the server runs from.
    pub release_id: String,
    /// Heap size the JVM was started with.
    pub heap: MemorySize,
    /// Directory the server runs in.
    pub working_dir: PathBuf,
    /// OS process id, when still known at handoff.
    pub pid: Option<u32>,
    /// The stdout line that signalled readiness.
    pub ready_line: String,
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    /// Whether a liveness marker was present and removed.
    pub marker_removed: bool,
    /// Server reply to the shutdown command; `None` when it was unreachable.
    pub reply: Option<String>,
}

/// Starts and stops the server of one launcher installation.
#[derive(Debug, Clone)]
pub struct Supervisor {
    java_bin: String,
    rcon: RconConfig,
    marker: LivenessMarker,
    readiness_marker: String,
    startup_timeout: Duration,
}

impl Supervisor {
    /// Build a supervisor from the launcher configuration.
    #[must_use]
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            java_bin: config.java_bin.clone(),
            rcon: config.rcon.clone(),
            marker: LivenessMarker::new(config.marker_path.clone()),
            readiness_marker: config.startup.readiness_marker.clone(),
            startup_timeout: config.startup_timeout(),
        }
    }

    /// Liveness marker shared by every release of this installation.
    #[must_use]
    pub fn marker(&self) -> &LivenessMarker {
        &self.marker
    }

    /// Start the server in `workdir`, detaching on Ctrl-C.
    ///
    /// # Errors
    ///
    /// See [`Supervisor::start_with_interrupt`].
    pub async fn start(
        &self,
        workdir: &WorkingDirectory,
        heap: MemorySize,
    ) -> Result<SupervisedProcess> {
        self.start_with_interrupt(workdir, heap, interrupt_signal()).await
    }

    /// Start the server in `workdir` and wait for readiness, or until
    /// `interrupt` resolves.
    ///
    /// # Errors
    ///
    /// - `AppError::AlreadyRunning` if the marker is present; nothing else
    ///   is touched.
    /// - `AppError::ArtifactNotFound` if the release jar is missing.
    /// - `AppError::ConfigNotFound` if `server.properties` is missing.
    /// - `AppError::Process` if the JVM cannot be spawned (marker removed)
    ///   or exits before readiness (marker removed).
    /// - `AppError::StartupTimeout` if no readiness line arrives in time;
    ///   child and marker are left in place.
    /// - `AppError::Interrupted` if `interrupt` fires first; child and
    ///   marker are left in place.
    /// - `AppError::Io` on file failures.
    pub async fn start_with_interrupt<I>(
        &self,
        workdir: &WorkingDirectory,
        heap: MemorySize,
        interrupt: I,
    ) -> Result<SupervisedProcess>
    where
        I: Future<Output = ()>,
    {
        let mut lifecycle = Lifecycle::new(self.marker.clone(), self.readiness_marker.clone());
        lifecycle.request_start()?;

        let jar = workdir.artifact_path();
        if !jar.is_file() {
            return Err(AppError::ArtifactNotFound(format!(
                "{} not found; run install-version first",
                jar.display()
            )));
        }

        workdir.accept_eula()?;
        let port = self.rcon.port.to_string();
        properties::set_properties(
            &workdir.properties_path(),
            &[
                ("enable-rcon", "true"),
                ("rcon.port", &port),
                ("rcon.password", &self.rcon.password),
            ],
        )?;

        let cleaner = OutputCleaner::new()?;
        lifecycle.claim_marker()?;

        let mut cmd = Command::new(&self.java_bin);
        cmd.arg(heap.heap_flag())
            .arg("-jar")
            .arg(&jar)
            .arg("--nogui")
            .current_dir(workdir.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        cmd.process_group(0);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                release_marker(&lifecycle, "spawn failure");
                return Err(AppError::Process(format!(
                    "failed to spawn {}: {err}",
                    self.java_bin
                )));
            }
        };

        let pid = child.id();
        info!(
            release = workdir.release_id(),
            heap = %heap,
            pid = ?pid,
            "server process spawned"
        );

        let Some(stdout) = child.stdout.take() else {
            if let Err(err) = child.start_kill() {
                warn!(%err, "failed to kill server after losing its stdout");
            }
            release_marker(&lifecycle, "stdout capture failure");
            return Err(AppError::Process("failed to capture server stdout".into()));
        };
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr, cleaner.clone()));
        }

        let exit = async move {
            match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    warn!(%err, "cannot observe server exit");
                    std::future::pending().await
                }
            }
        };

        let outcome = watch_startup(
            &mut lifecycle,
            &cleaner,
            stdout,
            exit,
            self.startup_timeout,
            interrupt,
        )
        .await?;

        match outcome {
            StartupOutcome::Ready { line, lines_seen } => {
                info!(
                    release = workdir.release_id(),
                    lines_seen,
                    "server ready; leaving it running"
                );
                Ok(SupervisedProcess {
                    release_id: workdir.release_id().to_owned(),
                    heap,
                    working_dir: workdir.root().to_path_buf(),
                    pid,
                    ready_line: line,
                })
            }
            StartupOutcome::Exited { code } => Err(AppError::Process(match code {
                Some(code) => format!("server exited with code {code} before it was ready"),
                None => "server was terminated before it was ready".into(),
            })),
            StartupOutcome::TimedOut => Err(AppError::StartupTimeout(format!(
                "no readiness line within {:?}; server left running, marker kept at {}",
                self.startup_timeout,
                self.marker.path().display()
            ))),
            StartupOutcome::Interrupted => Err(AppError::Interrupted(format!(
                "detached during startup; server left running, marker kept at {}",
                self.marker.path().display()
            ))),
        }
    }

    /// Clear the marker, then send the shutdown command over RCON.
    ///
    /// An unreachable server still counts as stopped.
    ///
    /// # Errors
    ///
    /// - `AppError::Auth`, `AppError::Protocol` or `AppError::Timeout` from
    ///   the RCON exchange; the marker stays removed.
    /// - `AppError::Io` if the marker cannot be removed.
    pub async fn stop(&self) -> Result<StopReport> {
        let mut lifecycle = Lifecycle::recover(self.marker.clone(), self.readiness_marker.clone());
        let marker_removed = lifecycle.request_stop()?;
        if !marker_removed {
            warn!("no liveness marker found; sending shutdown anyway");
        }

        let client = RconClient::from_config(&self.rcon);
        match client.send(SHUTDOWN_COMMAND).await {
            Ok(reply) => Ok(StopReport {
                marker_removed,
                reply: Some(reply),
            }),
            Err(AppError::Connection(msg)) => {
                warn!(
                    endpoint = %client.endpoint(),
                    %msg,
                    "server unreachable; treating as stopped"
                );
                Ok(StopReport {
                    marker_removed,
                    reply: None,
                })
            }
            Err(err) => Err(err),
        }
    }
}

/// Undo `claim_marker` when startup fails before the watch begins.
fn release_marker(lifecycle: &Lifecycle, cause: &str) {
    if let Err(err) = lifecycle.marker().remove() {
        warn!(%err, cause, "failed to remove marker");
    }
}

/// Resolves on Ctrl-C (or SIGTERM on unix); never resolves if no handler
/// can be installed.
async fn interrupt_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = ctrl_c => watch_handler(result).await,
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                watch_handler(ctrl_c.await).await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        watch_handler(ctrl_c.await).await;
    }
}

async fn watch_handler(result: std::io::Result<()>) {
    if let Err(err) = result {
        warn!(%err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
