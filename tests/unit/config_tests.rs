//! Unit tests for launcher configuration parsing and validation.

use std::path::Path;

use tempfile::TempDir;
use thiccpaper::config::{LauncherConfig, RCON_PASSWORD_ENV};
use thiccpaper::AppError;

fn sample_toml() -> &'static str {
    r#"
installations_dir = "servers"
registry_path = "state/registry.json"
marker_path = "/var/run/thiccpaper.lock"
java_bin = "/usr/lib/jvm/java-21/bin/java"

[rcon]
host = "127.0.0.1"
port = 25580
password = "hunter2"
timeout_seconds = 3

[startup]
readiness_marker = "Done ("
timeout_seconds = 60
default_memory = "4GB"

[release]
api_base_url = "http://localhost:8080/v2"
project = "paper"
"#
}

#[test]
fn empty_file_yields_defaults() {
    let base = Path::new("/srv/mc");
    let config = LauncherConfig::from_toml_str("", base).expect("defaults are valid");

    assert_eq!(config.installations_dir, base.join("paper-installations"));
    assert_eq!(config.registry_path, base.join("thiccpaper.json"));
    assert_eq!(config.marker_path, base.join("server.lock"));
    assert_eq!(config.java_bin, "java");
    assert_eq!(config.rcon.host, "localhost");
    assert_eq!(config.rcon.port, 25575);
    assert_eq!(config.rcon.password, "thiccpaper");
    assert_eq!(config.rcon.timeout_seconds, 5);
    assert_eq!(config.startup.readiness_marker, "For help, type \"help\"");
    assert_eq!(config.startup.timeout_seconds, 180);
    assert_eq!(config.startup.default_memory, "2GB");
    assert_eq!(config.release.api_base_url, "https://api.papermc.io/v2");
    assert_eq!(config.release.project, "paper");
}

#[test]
fn full_file_parses_and_resolves_relative_paths() {
    let base = Path::new("/srv/mc");
    let config = LauncherConfig::from_toml_str(sample_toml(), base).expect("valid");

    assert_eq!(config.installations_dir, base.join("servers"));
    assert_eq!(config.registry_path, base.join("state/registry.json"));
    assert_eq!(config.marker_path, Path::new("/var/run/thiccpaper.lock"));
    assert_eq!(config.rcon.port, 25580);
    assert_eq!(config.rcon.password, "hunter2");
    assert_eq!(config.rcon.timeout().as_secs(), 3);
    assert_eq!(config.startup_timeout().as_secs(), 60);
    assert_eq!(config.release_dir("paper-1.20.4-1"), base.join("servers/paper-1.20.4-1"));
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config =
        LauncherConfig::from_toml_str("[rcon]\nport = 25599\n", Path::new(".")).expect("valid");
    assert_eq!(config.rcon.port, 25599);
    assert_eq!(config.rcon.password, "thiccpaper");
}

#[test]
fn invalid_toml_is_config_error() {
    let err = LauncherConfig::from_toml_str("[rcon\nport = 1", Path::new(".")).unwrap_err();
    assert!(matches!(err, AppError::Config(_)), "got {err:?}");
}

#[test]
fn validation_rejects_bad_values() {
    for raw in [
        "[rcon]\nport = 0\n",
        "[rcon]\npassword = \"\"\n",
        "[rcon]\ntimeout_seconds = 0\n",
        "[startup]\ntimeout_seconds = 0\n",
        "[startup]\nreadiness_marker = \"  \"\n",
        "java_bin = \"\"\n",
        "[release]\nproject = \"\"\n",
    ] {
        let err = LauncherConfig::from_toml_str(raw, Path::new(".")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "{raw:?} gave {err:?}");
    }
}

#[test]
fn load_from_path_resolves_against_file_directory() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("thiccpaper.toml");
    std::fs::write(&path, "installations_dir = \"servers\"\n").expect("write");

    let config = LauncherConfig::load_from_path(&path).expect("load");

    assert_eq!(config.installations_dir, dir.path().join("servers"));
}

#[test]
fn load_from_missing_path_is_config_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = LauncherConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn discover_with_explicit_missing_path_fails() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    assert!(LauncherConfig::discover(Some(missing.as_path())).is_err());
}

/// NOTE: These tests mutate process-global env vars and must run serially.
#[test]
#[serial_test::serial]
fn env_password_overrides_file() {
    let mut config = LauncherConfig::from_toml_str(sample_toml(), Path::new(".")).expect("valid");
    std::env::set_var(RCON_PASSWORD_ENV, "from-env");

    config.apply_env_overrides();
    std::env::remove_var(RCON_PASSWORD_ENV);

    assert_eq!(config.rcon.password, "from-env");
}

#[test]
#[serial_test::serial]
fn empty_env_password_is_ignored() {
    let mut config = LauncherConfig::from_toml_str(sample_toml(), Path::new(".")).expect("valid");
    std::env::set_var(RCON_PASSWORD_ENV, "");

    config.apply_env_overrides();
    std::env::remove_var(RCON_PASSWORD_ENV);

    assert_eq!(config.rcon.password, "hunter2");
}

#[test]
#[serial_test::serial]
fn discover_applies_env_override() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, sample_toml()).expect("write");
    std::env::set_var(RCON_PASSWORD_ENV, "discovered");

    let config = LauncherConfig::discover(Some(path.as_path()));
    std::env::remove_var(RCON_PASSWORD_ENV);

    assert_eq!(config.expect("valid").rcon.password, "discovered");
}
