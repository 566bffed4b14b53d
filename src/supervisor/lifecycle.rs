//! Supervisor state machine.
//!
//! Pure transition logic, free of process and stream I/O. The only side
//! effect is the liveness marker, which the machine owns.
//!
//! ```text
//! Idle ──start──▶ Starting ──readiness line──▶ Running ──stop──▶ Stopping
//!                   │  └──deadline──▶ StartupTimedOut
//!                   └──────────── child exit (any state) ──────▶ Exited
//! ```

use std::fmt::{Display, Formatter};

use tracing::{info, warn};

use crate::marker::LivenessMarker;
use crate::{AppError, Result};

/// Observable supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Nothing supervised from this launcher.
    Idle,
    /// Preconditions passed; waiting for the readiness line.
    Starting,
    /// Readiness line seen.
    Running,
    /// Shutdown requested over RCON.
    Stopping,
    /// Child exit observed and marker cleaned up.
    Exited,
    /// No readiness line before the deadline; child and marker left in place.
    StartupTimedOut,
}

impl Display for ServerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Exited => "exited",
            Self::StartupTimedOut => "startup_timed_out",
        };
        f.write_str(name)
    }
}

/// Lifecycle of one supervised server.
#[derive(Debug)]
pub struct Lifecycle {
    state: ServerState,
    marker: LivenessMarker,
    readiness_marker: String,
}

impl Lifecycle {
    /// Fresh lifecycle in [`ServerState::Idle`].
    #[must_use]
    pub fn new(marker: LivenessMarker, readiness_marker: impl Into<String>) -> Self {
        Self {
            state: ServerState::Idle,
            marker,
            readiness_marker: readiness_marker.into(),
        }
    }

    /// Lifecycle seen from a separate invocation: `Running` when the marker is
    /// present, `Idle` otherwise.
    #[must_use]
    pub fn recover(marker: LivenessMarker, readiness_marker: impl Into<String>) -> Self {
        let mut lifecycle = Self::new(marker, readiness_marker);
        if lifecycle.marker.exists() {
            lifecycle.state = ServerState::Running;
        }
        lifecycle
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Marker owned by this lifecycle.
    #[must_use]
    pub fn marker(&self) -> &LivenessMarker {
        &self.marker
    }

    /// `Idle`/`Exited` → `Starting`.
    ///
    /// # Errors
    ///
    /// - `AppError::AlreadyRunning` if the marker is present; the marker is
    ///   not touched and the state does not change.
    /// - `AppError::Process` if called from any other state.
    pub fn request_start(&mut self) -> Result<()> {
        if self.marker.exists() {
            return Err(AppError::AlreadyRunning(format!(
                "marker {} is present; stop the server first",
                self.marker.path().display()
            )));
        }
        match self.state {
            ServerState::Idle | ServerState::Exited => {
                self.transition(ServerState::Starting);
                Ok(())
            }
            other => Err(AppError::Process(format!("cannot start while {other}"))),
        }
    }

    /// Create the marker ahead of spawn. Only valid while `Starting`.
    ///
    /// # Errors
    ///
    /// - `AppError::AlreadyRunning` if another marker appeared meanwhile.
    /// - `AppError::Process` outside `Starting`.
    /// - `AppError::Io` if the marker cannot be created.
    pub fn claim_marker(&mut self) -> Result<()> {
        if self.state != ServerState::Starting {
            return Err(AppError::Process(format!(
                "marker can only be claimed while starting (state: {})",
                self.state
            )));
        }
        self.marker.create()
    }

    /// Feed one stdout line. Returns `true` on the single `Starting` →
    /// `Running` transition; every later line returns `false`.
    pub fn observe_line(&mut self, line: &str) -> bool {
        if self.state == ServerState::Starting && line.contains(&self.readiness_marker) {
            self.transition(ServerState::Running);
            return true;
        }
        false
    }

    /// Child exit observed, from any state: remove the marker (idempotent)
    /// and move to `Exited`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if an existing marker cannot be removed; the
    /// state still moves to `Exited`.
    pub fn observe_exit(&mut self, code: Option<i32>) -> Result<()> {
        match code {
            Some(0) => info!(state = %self.state, "server process exited with code 0"),
            Some(c) => warn!(state = %self.state, code = c, "server process exited with code {c}"),
            None => warn!(state = %self.state, "server process terminated without exit code"),
        }
        self.transition(ServerState::Exited);
        self.marker.remove().map(|_| ())
    }

    /// Startup deadline passed while `Starting`. The marker is kept.
    pub fn expire_startup(&mut self) {
        if self.state == ServerState::Starting {
            self.transition(ServerState::StartupTimedOut);
        }
    }

    /// Enter `Stopping` and clear the marker before shutdown is confirmed.
    ///
    /// Returns whether a marker was present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the marker exists but cannot be removed.
    pub fn request_stop(&mut self) -> Result<bool> {
        self.transition(ServerState::Stopping);
        self.marker.remove()
    }

    fn transition(&mut self, next: ServerState) {
        info!(from = %self.state, to = %next, "server state transition");
        self.state = next;
    }
}
