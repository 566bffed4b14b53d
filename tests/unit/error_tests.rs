//! Unit tests for `AppError` display prefixes and conversions.

use thiccpaper::AppError;

#[test]
fn every_variant_has_a_distinct_prefix() {
    let cases = [
        (AppError::AlreadyRunning("x".into()), "already running: x"),
        (AppError::ArtifactNotFound("x".into()), "artifact not found: x"),
        (AppError::ConfigNotFound("x".into()), "config not found: x"),
        (AppError::Connection("x".into()), "connection: x"),
        (AppError::Auth("x".into()), "auth: x"),
        (AppError::Protocol("x".into()), "protocol: x"),
        (AppError::Timeout("x".into()), "timeout: x"),
        (AppError::InvalidInput("x".into()), "invalid input: x"),
        (AppError::StartupTimeout("x".into()), "startup timeout: x"),
        (AppError::Interrupted("x".into()), "interrupted: x"),
        (AppError::Process("x".into()), "process: x"),
        (AppError::NotFound("x".into()), "not found: x"),
        (AppError::Network("x".into()), "network: x"),
        (AppError::Integrity("x".into()), "integrity: x"),
        (AppError::Config("x".into()), "config: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Io("x".into()));
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
    assert!(err.to_string().starts_with("config: invalid config:"));
}

#[test]
fn io_errors_become_io_errors() {
    let err: AppError = std::io::Error::other("disk full").into();
    assert_eq!(err.to_string(), "io: disk full");
}

#[test]
fn json_errors_become_io_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
    assert!(err.to_string().starts_with("io: invalid json:"));
}
