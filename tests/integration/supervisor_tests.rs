//! Start and stop flows against fake `java` executables and an in-process
//! RCON server.

use std::fs;

use tempfile::TempDir;
use thiccpaper::supervisor::{MemorySize, Supervisor, WorkingDirectory, SHUTDOWN_COMMAND};
use thiccpaper::AppError;

use super::test_helpers::{
    closed_port, install_release, test_config, FakeRconServer, TEST_PASSWORD,
};

const RELEASE: &str = "paper-1.20.4-496";

fn workdir(config: &thiccpaper::LauncherConfig) -> WorkingDirectory {
    WorkingDirectory::new(&config.installations_dir, RELEASE).expect("valid id")
}

fn heap() -> MemorySize {
    "2GB".parse().expect("valid size")
}

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::time::Duration;

    use tempfile::TempDir;
    use thiccpaper::properties;
    use thiccpaper::supervisor::Supervisor;
    use thiccpaper::AppError;

    use super::super::test_helpers::{
        config_with_java, fake_java, install_release, kill, TEST_PASSWORD,
    };
    use super::{heap, workdir, RELEASE};

    const READY_SCRIPT: &str = r#"echo "$@" > java-args.txt
echo "Starting minecraft server version 1.20.4"
echo "Preparing level \"world\""
echo "Done (1.234s)! For help, type \"help\""
exec sleep 30"#;

    #[tokio::test]
    #[serial_test::serial]
    async fn start_patches_config_and_returns_when_ready() {
        let dir = TempDir::new().expect("tempdir");
        let java = fake_java(dir.path(), READY_SCRIPT);
        let config = config_with_java(dir.path(), 25575, java.to_str().unwrap(), 10);
        let root = install_release(
            &config,
            RELEASE,
            Some("motd=A ThiccPaper Server\nrcon.password=oldvalue\n"),
        );

        let process = Supervisor::from_config(&config)
            .start(&workdir(&config), heap())
            .await
            .expect("server becomes ready");
        kill(process.pid);

        assert_eq!(process.release_id, RELEASE);
        assert_eq!(process.heap.megabytes(), 2048);
        assert_eq!(process.working_dir, root);
        assert_eq!(process.ready_line, "Done (1.234s)! For help, type \"help\"");
        assert!(config.marker_path.exists(), "marker stays while the server runs");

        let props = root.join("server.properties");
        assert_eq!(
            properties::get_property(&props, "rcon.password").unwrap().as_deref(),
            Some(TEST_PASSWORD)
        );
        assert_eq!(
            properties::get_property(&props, "rcon.port").unwrap().as_deref(),
            Some("25575")
        );
        assert_eq!(
            properties::get_property(&props, "enable-rcon").unwrap().as_deref(),
            Some("true")
        );
        assert!(fs::read_to_string(&props).unwrap().starts_with("motd=A ThiccPaper Server\n"));
        assert_eq!(fs::read_to_string(root.join("eula.txt")).unwrap(), "eula=true\n");

        let args = fs::read_to_string(root.join("java-args.txt")).unwrap();
        let jar = root.join(format!("{RELEASE}.jar"));
        assert_eq!(args.trim(), format!("-Xmx2048M -jar {} --nogui", jar.display()));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn exit_before_ready_is_process_error_and_clears_marker() {
        let dir = TempDir::new().expect("tempdir");
        let java = fake_java(dir.path(), "echo 'Error: invalid heap' >&2\nexit 3");
        let config = config_with_java(dir.path(), 25575, java.to_str().unwrap(), 10);
        install_release(&config, RELEASE, Some("enable-rcon=false\n"));

        let err = Supervisor::from_config(&config)
            .start(&workdir(&config), heap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Process(_)), "got {err:?}");
        assert!(err.to_string().contains("code 3"));
        assert!(!config.marker_path.exists());
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn missing_readiness_line_times_out_and_keeps_marker() {
        let dir = TempDir::new().expect("tempdir");
        let java = fake_java(dir.path(), "echo $$ > pid.txt\necho 'Loading libraries'\nexec sleep 30");
        let config = config_with_java(dir.path(), 25575, java.to_str().unwrap(), 1);
        let root = install_release(&config, RELEASE, Some("enable-rcon=false\n"));

        let err = Supervisor::from_config(&config)
            .start(&workdir(&config), heap())
            .await
            .unwrap_err();
        let pid = fs::read_to_string(root.join("pid.txt"))
            .ok()
            .and_then(|raw| raw.trim().parse().ok());
        kill(pid);

        assert!(matches!(err, AppError::StartupTimeout(_)), "got {err:?}");
        assert!(config.marker_path.exists());
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn endless_output_without_readiness_still_times_out() {
        let dir = TempDir::new().expect("tempdir");
        let java = fake_java(dir.path(), "echo $$ > pid.txt\nexec yes spam");
        let config = config_with_java(dir.path(), 25575, java.to_str().unwrap(), 1);
        let root = install_release(&config, RELEASE, Some("enable-rcon=false\n"));

        let result = tokio::time::timeout(
            Duration::from_secs(8),
            Supervisor::from_config(&config).start(&workdir(&config), heap()),
        )
        .await;
        let pid = fs::read_to_string(root.join("pid.txt"))
            .ok()
            .and_then(|raw| raw.trim().parse().ok());
        kill(pid);

        let err = result.expect("startup deadline fires").unwrap_err();
        assert!(matches!(err, AppError::StartupTimeout(_)), "got {err:?}");
        assert!(config.marker_path.exists());
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn interrupt_detaches_and_keeps_marker() {
        let dir = TempDir::new().expect("tempdir");
        let java = fake_java(dir.path(), "echo $$ > pid.txt\nexec sleep 30");
        let config = config_with_java(dir.path(), 25575, java.to_str().unwrap(), 10);
        let root = install_release(&config, RELEASE, Some("enable-rcon=false\n"));

        let interrupt = tokio::time::sleep(Duration::from_millis(300));
        let err = Supervisor::from_config(&config)
            .start_with_interrupt(&workdir(&config), heap(), interrupt)
            .await
            .unwrap_err();
        let pid = fs::read_to_string(root.join("pid.txt"))
            .ok()
            .and_then(|raw| raw.trim().parse().ok());
        kill(pid);

        assert!(matches!(err, AppError::Interrupted(_)), "got {err:?}");
        assert!(config.marker_path.exists());
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn spawn_failure_is_process_error_and_clears_marker() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("no-such-java");
        let config = config_with_java(dir.path(), 25575, missing.to_str().unwrap(), 10);
        install_release(&config, RELEASE, Some("enable-rcon=false\n"));

        let err = Supervisor::from_config(&config)
            .start(&workdir(&config), heap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Process(_)), "got {err:?}");
        assert!(!config.marker_path.exists());
    }
}

#[tokio::test]
async fn start_with_marker_present_touches_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(dir.path(), 25575);
    let root = install_release(&config, RELEASE, Some("rcon.password=oldvalue\n"));
    fs::write(&config.marker_path, b"").unwrap();

    let err = Supervisor::from_config(&config)
        .start(&workdir(&config), heap())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AlreadyRunning(_)), "got {err:?}");
    assert!(config.marker_path.exists());
    assert_eq!(
        fs::read_to_string(root.join("server.properties")).unwrap(),
        "rcon.password=oldvalue\n"
    );
    assert!(!root.join("eula.txt").exists());
}

#[tokio::test]
async fn start_without_jar_is_artifact_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(dir.path(), 25575);

    let err = Supervisor::from_config(&config)
        .start(&workdir(&config), heap())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ArtifactNotFound(_)), "got {err:?}");
    assert!(!config.marker_path.exists());
}

#[tokio::test]
async fn start_without_properties_is_config_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(dir.path(), 25575);
    install_release(&config, RELEASE, None);

    let err = Supervisor::from_config(&config)
        .start(&workdir(&config), heap())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConfigNotFound(_)), "got {err:?}");
    assert!(!config.marker_path.exists());
}

#[tokio::test]
async fn stop_clears_marker_and_sends_shutdown() {
    let server = FakeRconServer::spawn("Stopping the server").await;
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(dir.path(), server.port);
    fs::write(&config.marker_path, b"").unwrap();

    let report = Supervisor::from_config(&config).stop().await.expect("stop");

    assert!(report.marker_removed);
    assert_eq!(report.reply.as_deref(), Some("Stopping the server"));
    assert_eq!(server.received(), vec![SHUTDOWN_COMMAND.to_owned()]);
    assert!(!config.marker_path.exists());
}

#[tokio::test]
async fn stop_with_unreachable_server_still_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(dir.path(), closed_port().await);
    fs::write(&config.marker_path, b"").unwrap();

    let report = Supervisor::from_config(&config).stop().await.expect("stop");

    assert!(report.marker_removed);
    assert_eq!(report.reply, None);
    assert!(!config.marker_path.exists());
}

#[tokio::test]
async fn stop_with_wrong_password_fails_but_marker_stays_removed() {
    let server = FakeRconServer::spawn("ok").await;
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(dir.path(), server.port);
    config.rcon.password = format!("not-{TEST_PASSWORD}");
    fs::write(&config.marker_path, b"").unwrap();

    let err = Supervisor::from_config(&config).stop().await.unwrap_err();

    assert!(matches!(err, AppError::Auth(_)), "got {err:?}");
    assert!(!config.marker_path.exists());
}

#[tokio::test]
async fn stop_without_marker_still_sends_shutdown() {
    let server = FakeRconServer::spawn("").await;
    let dir = TempDir::new().expect("tempdir");
    let config = test_config(dir.path(), server.port);

    let report = Supervisor::from_config(&config).stop().await.expect("stop");

    assert!(!report.marker_removed);
    assert_eq!(server.received(), vec![SHUTDOWN_COMMAND.to_owned()]);
}
