//! Line-preserving `key=value` patching for `server.properties`-style files.
//!
//! A patch touches at most one line: the first line that starts with
//! `key=` gets its value replaced, otherwise a single `key=value` line is
//! appended. Every other byte of the file, including comments, blank lines,
//! and line terminators, is left as it was. The result is written back
//! whole through [`crate::persist::write_atomic`].

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::persist::write_atomic;
use crate::{AppError, Result};

/// What a single patch did to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// An existing line (zero-based index) had its value replaced.
    Replaced {
        /// Index of the rewritten line.
        line: usize,
        /// Value the line held before the patch.
        previous: String,
    },
    /// The key was absent and a new trailing line was appended.
    Appended,
}

/// Set `key` to `value` in the properties file at `file`.
///
/// # Errors
///
/// - `AppError::ConfigNotFound` if `file` does not exist.
/// - `AppError::InvalidInput` if `key` or `value` cannot form a single line.
/// - `AppError::Io` if the file cannot be read or written.
pub fn set_property(file: &Path, key: &str, value: &str) -> Result<PatchOutcome> {
    let mut outcomes = set_properties(file, &[(key, value)])?;
    outcomes
        .pop()
        .ok_or_else(|| AppError::Io("patch produced no outcome".into()))
}

/// Apply several `key=value` patches with a single read and a single write.
///
/// Patches apply in order, each with the same single-line rule as
/// [`set_property`].
///
/// # Errors
///
/// Same as [`set_property`]. Nothing is written when any patch is invalid.
pub fn set_properties(file: &Path, pairs: &[(&str, &str)]) -> Result<Vec<PatchOutcome>> {
    let mut text = read_properties(file)?;
    let mut outcomes = Vec::with_capacity(pairs.len());

    for &(key, value) in pairs {
        let (patched, outcome) = patch_text(&text, key, value)?;
        debug!(file = %file.display(), key, ?outcome, "property patched");
        text = patched;
        outcomes.push(outcome);
    }

    write_atomic(file, text.as_bytes())?;
    Ok(outcomes)
}

/// Read the current value of `key`, if present.
///
/// # Errors
///
/// - `AppError::ConfigNotFound` if `file` does not exist.
/// - `AppError::Io` on other read failures.
pub fn get_property(file: &Path, key: &str) -> Result<Option<String>> {
    let text = read_properties(file)?;
    Ok(lookup(&text, key).map(str::to_owned))
}

/// Value of the first `key=` line in `text`.
#[must_use]
pub fn lookup<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.split_inclusive('\n')
        .find_map(|raw| split_terminator(raw).0.strip_prefix(key)?.strip_prefix('='))
}

/// Pure form of [`set_property`]: returns the patched text.
///
/// The appended line uses the file's dominant terminator (`\r\n` when the
/// text contains one, `\n` otherwise) and ends with it only when the
/// original text ended with a terminator or was empty.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if `key` is empty or contains `=`, or if
/// either argument contains a line break.
pub fn patch_text(text: &str, key: &str, value: &str) -> Result<(String, PatchOutcome)> {
    validate(key, value)?;

    let mut out = String::with_capacity(text.len() + key.len() + value.len() + 2);
    let mut outcome = None;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let (content, terminator) = split_terminator(raw);
        if outcome.is_none() {
            if let Some(previous) = content.strip_prefix(key).and_then(|r| r.strip_prefix('=')) {
                outcome = Some(PatchOutcome::Replaced {
                    line: index,
                    previous: previous.to_owned(),
                });
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push_str(terminator);
                continue;
            }
        }
        out.push_str(raw);
    }

    if let Some(outcome) = outcome {
        return Ok((out, outcome));
    }

    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let terminated = text.is_empty() || text.ends_with('\n');
    if !terminated {
        out.push_str(newline);
    }
    out.push_str(key);
    out.push('=');
    out.push_str(value);
    if terminated {
        out.push_str(newline);
    }
    Ok((out, PatchOutcome::Appended))
}

fn read_properties(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            AppError::ConfigNotFound(file.display().to_string())
        } else {
            AppError::Io(format!("failed to read {}: {err}", file.display()))
        }
    })
}

fn validate(key: &str, value: &str) -> Result<()> {
    if key.is_empty() || key.contains('=') {
        return Err(AppError::InvalidInput(format!("invalid property key '{key}'")));
    }
    if [key, value].iter().any(|s| s.contains(['\n', '\r'])) {
        return Err(AppError::InvalidInput(format!(
            "property {key} must fit on a single line"
        )));
    }
    Ok(())
}

/// Split a raw line into its content and its `\n` / `\r\n` terminator.
fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(content) = raw.strip_suffix("\r\n") {
        (content, &raw[content.len()..])
    } else if let Some(content) = raw.strip_suffix('\n') {
        (content, &raw[content.len()..])
    } else {
        (raw, "")
    }
}
