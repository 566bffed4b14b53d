//! Unit tests for build selection and release layout helpers.

use thiccpaper::config::RconConfig;
use thiccpaper::installer::{default_properties, release_id, select_latest, BuildsResponse};
use thiccpaper::properties;

#[test]
fn latest_build_is_highest_number_not_last_listed() {
    let builds: BuildsResponse = serde_json::from_str(
        r#"{
            "project_id": "paper",
            "version": "1.20.4",
            "builds": [
                {"build": 496, "downloads": {"application": {"name": "paper-1.20.4-496.jar", "sha256": "aa"}}},
                {"build": 499, "downloads": {"application": {"name": "paper-1.20.4-499.jar", "sha256": "bb"}}},
                {"build": 497, "downloads": {"application": {"name": "paper-1.20.4-497.jar", "sha256": "cc"}}}
            ]
        }"#,
    )
    .expect("valid body");

    let latest = select_latest(&builds.builds).expect("has builds");

    assert_eq!(latest.build, 499);
    let download = latest.downloads.application.as_ref().expect("jar");
    assert_eq!(download.name, "paper-1.20.4-499.jar");
    assert_eq!(download.sha256.as_deref(), Some("bb"));
}

#[test]
fn no_builds_selects_nothing() {
    let builds: BuildsResponse = serde_json::from_str(r#"{"builds": []}"#).unwrap();
    assert!(select_latest(&builds.builds).is_none());
}

#[test]
fn build_without_downloads_still_parses() {
    let builds: BuildsResponse = serde_json::from_str(r#"{"builds": [{"build": 3}]}"#).unwrap();
    assert!(builds.builds[0].downloads.application.is_none());
}

#[test]
fn release_id_joins_project_version_build() {
    assert_eq!(release_id("paper", "1.20.4", 496), "paper-1.20.4-496");
}

#[test]
fn default_properties_carry_rcon_settings() {
    let rcon = RconConfig {
        port: 25580,
        password: "hunter2".into(),
        ..RconConfig::default()
    };

    let text = default_properties(&rcon);

    assert_eq!(properties::lookup(&text, "enable-rcon"), Some("true"));
    assert_eq!(properties::lookup(&text, "rcon.port"), Some("25580"));
    assert_eq!(properties::lookup(&text, "rcon.password"), Some("hunter2"));
    assert_eq!(properties::lookup(&text, "server-port"), Some("25565"));
    assert_eq!(properties::lookup(&text, "level-type"), Some("minecraft\\:normal"));
    assert!(text.starts_with("#Minecraft server properties\n"));
    assert!(text.ends_with("white-list=false\n"));
}
