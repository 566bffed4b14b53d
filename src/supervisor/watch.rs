//! Startup watch: drives a [`Lifecycle`] from the child's output and exit.
//!
//! Four event sources are awaited in one biased `tokio::select!` on the
//! current task: the child's exit, an operator interrupt, the startup
//! deadline, and stdout lines, polled in that order. Handlers never run
//! concurrently.

use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use regex::Regex;
use tokio::io::AsyncRead;
use tokio::time::Instant;
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::supervisor::lifecycle::Lifecycle;
use crate::{AppError, Result};

/// Longest output line kept; longer lines are skipped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Terminal colour / cursor escape sequences.
const ANSI_ESCAPE: &str = r"\x1b\[[0-9;?]*[A-Za-z]";

/// One decoded unit of server output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// A complete line without its terminator.
    Text(String),
    /// A line that was dropped: longer than [`MAX_LINE_BYTES`] or not UTF-8.
    Skipped(&'static str),
}

/// Line codec for server output.
///
/// Wraps [`LinesCodec`] so that overlong and non-UTF-8 lines become
/// [`OutputLine::Skipped`] items instead of errors; a decoder error would
/// otherwise end the [`FramedRead`] stream and blind the readiness watch.
#[derive(Debug)]
pub struct OutputCodec(LinesCodec);

impl OutputCodec {
    /// Codec with the [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for OutputCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OutputCodec {
    type Item = OutputLine;
    type Error = LinesCodecError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<OutputLine>, LinesCodecError> {
        absorb(self.0.decode(src))
    }

    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<OutputLine>, LinesCodecError> {
        absorb(self.0.decode_eof(src))
    }
}

fn absorb(
    decoded: std::result::Result<Option<String>, LinesCodecError>,
) -> std::result::Result<Option<OutputLine>, LinesCodecError> {
    match decoded {
        Ok(line) => Ok(line.map(OutputLine::Text)),
        Err(LinesCodecError::MaxLineLengthExceeded) => {
            Ok(Some(OutputLine::Skipped("line too long")))
        }
        Err(LinesCodecError::Io(err)) if err.kind() == ErrorKind::InvalidData => {
            Ok(Some(OutputLine::Skipped("line is not utf-8")))
        }
        Err(err) => Err(err),
    }
}

/// How a startup watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    /// The readiness line arrived.
    Ready {
        /// The matching line, escape sequences removed.
        line: String,
        /// Stdout lines read, the matching one included.
        lines_seen: usize,
    },
    /// The child exited first; the marker has been removed.
    Exited {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },
    /// The deadline passed first.
    TimedOut,
    /// The operator interrupted the watch.
    Interrupted,
}

/// Strips terminal escape sequences from server output.
#[derive(Debug, Clone)]
pub struct OutputCleaner(Regex);

impl OutputCleaner {
    /// Compile the escape-sequence pattern.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the pattern fails to compile.
    pub fn new() -> Result<Self> {
        Regex::new(ANSI_ESCAPE)
            .map(Self)
            .map_err(|err| AppError::Config(format!("invalid output pattern: {err}")))
    }

    /// `line` without escape sequences or a trailing `\r`.
    #[must_use]
    pub fn clean(&self, line: &str) -> String {
        self.0
            .replace_all(line.trim_end_matches('\r'), "")
            .into_owned()
    }
}

/// Watch a freshly spawned child until it is ready, exits, times out, or the
/// operator interrupts.
///
/// `exit` resolves with the child's exit code once the OS reports
/// termination. Output that keeps flowing after stdout closes is not
/// required: the watch keeps waiting on the remaining sources. The deadline
/// is checked before every line, so a child flooding stdout still times out.
///
/// # Errors
///
/// Returns `AppError::Io` if the marker cannot be removed after an exit.
pub async fn watch_startup<R, E, I>(
    lifecycle: &mut Lifecycle,
    cleaner: &OutputCleaner,
    stdout: R,
    exit: E,
    deadline: Duration,
    interrupt: I,
) -> Result<StartupOutcome>
where
    R: AsyncRead + Unpin,
    E: Future<Output = Option<i32>>,
    I: Future<Output = ()>,
{
    let mut lines = FramedRead::new(stdout, OutputCodec::new());
    let mut stdout_open = true;
    let mut lines_seen = 0usize;

    let expires_at = Instant::now() + deadline;
    let sleep = tokio::time::sleep_until(expires_at);
    tokio::pin!(exit, interrupt, sleep);

    loop {
        tokio::select! {
            biased;

            code = &mut exit => {
                lifecycle.observe_exit(code)?;
                return Ok(StartupOutcome::Exited { code });
            }

            () = &mut interrupt => {
                info!("startup watch interrupted");
                return Ok(StartupOutcome::Interrupted);
            }

            () = &mut sleep => {
                lifecycle.expire_startup();
                return Ok(StartupOutcome::TimedOut);
            }

            item = lines.next(), if stdout_open => {
                match item {
                    Some(Ok(OutputLine::Text(raw))) => {
                        lines_seen += 1;
                        let line = cleaner.clean(&raw);
                        info!(stream = "stdout", "{line}");
                        if lifecycle.observe_line(&line) {
                            return Ok(StartupOutcome::Ready { line, lines_seen });
                        }
                    }
                    Some(Ok(OutputLine::Skipped(reason))) => {
                        lines_seen += 1;
                        warn!(reason, "server stdout line skipped");
                    }
                    Some(Err(err)) => {
                        warn!(%err, "server stdout read failed");
                        stdout_open = false;
                    }
                    None => {
                        debug!("server stdout closed");
                        stdout_open = false;
                    }
                }
                // An always-ready reader can starve the timer branch.
                if Instant::now() >= expires_at {
                    lifecycle.expire_startup();
                    return Ok(StartupOutcome::TimedOut);
                }
            },
        }
    }
}

/// Forward every stderr line to the log until the stream closes.
pub async fn forward_stderr<R>(stderr: R, cleaner: OutputCleaner)
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(stderr, OutputCodec::new());
    while let Some(item) = lines.next().await {
        match item {
            Ok(OutputLine::Text(raw)) => warn!(stream = "stderr", "{}", cleaner.clean(&raw)),
            Ok(OutputLine::Skipped(reason)) => debug!(reason, "server stderr line skipped"),
            Err(err) => {
                debug!(%err, "server stderr read failed");
                break;
            }
        }
    }
}
