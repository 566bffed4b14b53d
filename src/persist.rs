//! Atomic whole-file writes.
//!
//! Content goes to a temporary file in the target's directory which is then
//! renamed over the target via `tempfile::NamedTempFile::persist()`. A
//! failed write leaves the original file untouched.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{AppError, Result};

/// Atomically replace (or create) `path` with `content`.
///
/// Parent directories are created when missing.
///
/// # Errors
///
/// Returns `AppError::Io` on directory creation, temp file write, or rename
/// failure.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent).map_err(|err| {
        AppError::Io(format!(
            "failed to create parent directories for {}: {err}",
            path.display()
        ))
    })?;

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|err| AppError::Io(format!("failed to create temporary file: {err}")))?;

    tmp.write_all(content)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| AppError::Io(format!("failed to write temporary file: {err}")))?;

    tmp.persist(path).map_err(|err| {
        AppError::Io(format!("failed to persist file to {}: {err}", path.display()))
    })?;
    Ok(())
}
