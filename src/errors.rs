//! Error types shared across the launcher.

use std::fmt::{Display, Formatter};

/// Shared launcher result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Launcher error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// The liveness marker is present; a server is already supervised.
    AlreadyRunning(String),
    /// The release jar is missing from its working directory.
    ArtifactNotFound(String),
    /// The server configuration file to patch does not exist.
    ConfigNotFound(String),
    /// RCON endpoint unreachable or the connection dropped mid-exchange.
    Connection(String),
    /// RCON password rejected by the server.
    Auth(String),
    /// RCON reply could not be parsed or did not match the request.
    Protocol(String),
    /// RCON reply did not arrive within the configured bound.
    Timeout(String),
    /// Malformed memory size or missing/invalid CLI argument.
    InvalidInput(String),
    /// The server did not report readiness before the startup deadline.
    StartupTimeout(String),
    /// The startup watch was interrupted by the operator.
    Interrupted(String),
    /// Spawn failure or the server exited before becoming ready.
    Process(String),
    /// Requested release or entity does not exist.
    NotFound(String),
    /// Release API or download failure.
    Network(String),
    /// Downloaded artifact failed checksum verification.
    Integrity(String),
    /// Launcher configuration parsing or validation failure.
    Config(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning(msg) => write!(f, "already running: {msg}"),
            Self::ArtifactNotFound(msg) => write!(f, "artifact not found: {msg}"),
            Self::ConfigNotFound(msg) => write!(f, "config not found: {msg}"),
            Self::Connection(msg) => write!(f, "connection: {msg}"),
            Self::Auth(msg) => write!(f, "auth: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::StartupTimeout(msg) => write!(f, "startup timeout: {msg}"),
            Self::Interrupted(msg) => write!(f, "interrupted: {msg}"),
            Self::Process(msg) => write!(f, "process: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Network(msg) => write!(f, "network: {msg}"),
            Self::Integrity(msg) => write!(f, "integrity: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(format!("invalid json: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
