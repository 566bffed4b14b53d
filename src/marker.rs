//! Filesystem liveness marker.
//!
//! A zero-byte file whose presence means "a supervised server is running".
//! The marker is keyed by a fixed path per launcher installation, so at most
//! one server per installation is supervised at a time.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::{AppError, Result};

/// Serializes check-then-create across all markers in this process.
static CREATE_LOCK: Mutex<()> = Mutex::new(());

/// Handle to the liveness marker file.
#[derive(Debug, Clone)]
pub struct LivenessMarker {
    path: PathBuf,
}

impl LivenessMarker {
    /// Create a handle for the marker at `path`. Touches nothing on disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Marker file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the marker is currently present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the marker.
    ///
    /// The presence check and the creation run under one in-process lock,
    /// and the file is opened with `create_new` so a marker created by
    /// another process between the two steps is still refused.
    ///
    /// # Errors
    ///
    /// - `AppError::AlreadyRunning` if the marker already exists.
    /// - `AppError::Io` if the file cannot be created.
    pub fn create(&self) -> Result<()> {
        let _guard = CREATE_LOCK
            .lock()
            .map_err(|_| AppError::Io("liveness marker lock poisoned".into()))?;

        if self.exists() {
            return Err(self.already_running());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                AppError::Io(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                info!(marker = %self.path.display(), "liveness marker created");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(self.already_running()),
            Err(err) => Err(AppError::Io(format!(
                "failed to create marker {}: {err}",
                self.path.display()
            ))),
        }
    }

    /// Remove the marker. Removing an absent marker is a no-op.
    ///
    /// Returns whether a marker was actually removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(marker = %self.path.display(), "liveness marker removed");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(marker = %self.path.display(), "liveness marker already absent");
                Ok(false)
            }
            Err(err) => Err(AppError::Io(format!(
                "failed to remove marker {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn already_running(&self) -> AppError {
        AppError::AlreadyRunning(format!(
            "marker {} is present; stop the server first",
            self.path.display()
        ))
    }
}
