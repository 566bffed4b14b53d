//! Release installer backed by the `PaperMC` downloads API (v2).
//!
//! `install` resolves the newest build of a Minecraft version, downloads its
//! jar into `<installations>/<release-id>/`, checks the published sha256,
//! and seeds `eula.txt` and `server.properties` when they are absent.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{LauncherConfig, RconConfig};
use crate::persist::write_atomic;
use crate::registry::InstalledRelease;
use crate::supervisor::WorkingDirectory;
use crate::{AppError, Result};

/// `User-Agent` sent with every API request.
const USER_AGENT: &str = concat!("thiccpaper/", env!("CARGO_PKG_VERSION"));

/// Default `server.properties` for a fresh release. `{rcon_port}` and
/// `{rcon_password}` are filled from the launcher configuration.
const SERVER_PROPERTIES_TEMPLATE: &str = "\
#Minecraft server properties
accepts-transfers=false
allow-flight=false
allow-nether=true
broadcast-console-to-ops=true
broadcast-rcon-to-ops=true
bug-report-link=
debug=false
difficulty=easy
enable-command-block=false
enable-jmx-monitoring=false
enable-query=false
enable-rcon=true
enable-status=true
enforce-secure-profile=true
enforce-whitelist=false
entity-broadcast-range-percentage=100
force-gamemode=false
function-permission-level=2
gamemode=survival
generate-structures=true
generator-settings={}
hardcore=false
hide-online-players=false
initial-disabled-packs=
initial-enabled-packs=vanilla
level-name=world
level-seed=
level-type=minecraft\\:normal
log-ips=true
max-chained-neighbor-updates=1000000
max-players=20
max-tick-time=60000
max-world-size=29999984
motd=A ThiccPaper Server
network-compression-threshold=256
online-mode=true
op-permission-level=4
player-idle-timeout=0
prevent-proxy-connections=false
pvp=true
query.port=25565
rate-limit=0
rcon.password={rcon_password}
rcon.port={rcon_port}
region-file-compression=deflate
require-resource-pack=false
resource-pack=
resource-pack-id=
resource-pack-prompt=
resource-pack-sha1=
server-ip=
server-port=25565
simulation-distance=10
spawn-animals=true
spawn-monsters=true
spawn-npcs=true
spawn-protection=16
sync-chunk-writes=true
text-filtering-config=
use-native-transport=true
view-distance=10
white-list=false
";

/// `GET /projects/{project}/versions/{version}/builds` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildsResponse {
    /// Every published build of the version.
    #[serde(default)]
    pub builds: Vec<BuildInfo>,
}

/// One published build.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    /// Build number; higher is newer.
    pub build: u32,
    /// Downloadable files of the build.
    #[serde(default)]
    pub downloads: BuildDownloads,
}

/// Downloads attached to a build.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildDownloads {
    /// The server jar.
    pub application: Option<DownloadInfo>,
}

/// One downloadable file.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadInfo {
    /// File name used in the download URL.
    pub name: String,
    /// Hex sha256 of the file.
    pub sha256: Option<String>,
}

/// Newest build, by build number.
#[must_use]
pub fn select_latest(builds: &[BuildInfo]) -> Option<&BuildInfo> {
    builds.iter().max_by_key(|info| info.build)
}

/// `<project>-<minecraft-version>-<build>`, e.g. `paper-1.20.4-496`.
#[must_use]
pub fn release_id(project: &str, minecraft_version: &str, build: u32) -> String {
    format!("{project}-{minecraft_version}-{build}")
}

/// `server.properties` content for a fresh release.
#[must_use]
pub fn default_properties(rcon: &RconConfig) -> String {
    SERVER_PROPERTIES_TEMPLATE
        .replace("{rcon_port}", &rcon.port.to_string())
        .replace("{rcon_password}", &rcon.password)
}

/// Downloads and lays out releases.
#[derive(Debug, Clone)]
pub struct ReleaseInstaller {
    client: reqwest::Client,
    api_base_url: String,
    project: String,
    installations_dir: PathBuf,
    rcon: RconConfig,
}

impl ReleaseInstaller {
    /// Build an installer from the launcher configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Network` if the HTTP client cannot be built.
    pub fn from_config(config: &LauncherConfig) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_base_url: config.release.api_base_url.trim_end_matches('/').to_owned(),
            project: config.release.project.clone(),
            installations_dir: config.installations_dir.clone(),
            rcon: config.rcon.clone(),
        })
    }

    /// Install the newest build of `minecraft_version`.
    ///
    /// An existing jar of the same release is replaced; existing
    /// `eula.txt` and `server.properties` are kept.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidInput` for a malformed version string.
    /// - `AppError::NotFound` if the version is unknown or has no builds.
    /// - `AppError::Network` on HTTP failures.
    /// - `AppError::Integrity` if the jar's sha256 does not match.
    ///
    /// A failed install removes the release directory if it created it.
    /// - `AppError::Io` on file failures.
    pub async fn install(&self, minecraft_version: &str) -> Result<InstalledRelease> {
        validate_version(minecraft_version)?;

        let builds = self.fetch_builds(minecraft_version).await?;
        let latest = select_latest(&builds.builds).ok_or_else(|| {
            AppError::NotFound(format!("no builds published for {minecraft_version}"))
        })?;

        let id = release_id(&self.project, minecraft_version, latest.build);
        let workdir = WorkingDirectory::new(&self.installations_dir, &id)?;
        let file_name = latest
            .downloads
            .application
            .as_ref()
            .map_or_else(|| format!("{id}.jar"), |download| download.name.clone());
        let expected = latest
            .downloads
            .application
            .as_ref()
            .and_then(|download| download.sha256.clone());

        info!(release = %id, build = latest.build, "installing release");
        let fresh = !workdir.exists();
        let laid_out = match self
            .download(minecraft_version, latest.build, &file_name, &workdir, expected.as_deref())
            .await
        {
            Ok(()) => self.seed_files(&workdir),
            Err(err) => Err(err),
        };
        if let Err(err) = laid_out {
            if fresh {
                discard_release_dir(&workdir);
            }
            return Err(err);
        }

        Ok(InstalledRelease {
            id,
            minecraft_version: minecraft_version.to_owned(),
            build: latest.build,
            installed_at: Utc::now(),
        })
    }

    fn version_url(&self, minecraft_version: &str) -> String {
        format!(
            "{}/projects/{}/versions/{minecraft_version}",
            self.api_base_url, self.project
        )
    }

    async fn fetch_builds(&self, minecraft_version: &str) -> Result<BuildsResponse> {
        let url = format!("{}/builds", self.version_url(minecraft_version));
        debug!(%url, "fetching builds");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "unknown {} version {minecraft_version}",
                self.project
            )));
        }
        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }
        Ok(response.json::<BuildsResponse>().await?)
    }

    async fn download(
        &self,
        minecraft_version: &str,
        build: u32,
        file_name: &str,
        workdir: &WorkingDirectory,
        expected_sha256: Option<&str>,
    ) -> Result<()> {
        let url = format!(
            "{}/builds/{build}/downloads/{file_name}",
            self.version_url(minecraft_version)
        );
        let mut response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        std::fs::create_dir_all(workdir.root()).map_err(|err| {
            AppError::Io(format!("failed to create {}: {err}", workdir.root().display()))
        })?;
        let mut tmp = NamedTempFile::new_in(workdir.root())
            .map_err(|err| AppError::Io(format!("failed to create temp file: {err}")))?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            hasher.update(&chunk);
            tmp.write_all(&chunk)
                .map_err(|err| AppError::Io(format!("failed to write download: {err}")))?;
            downloaded += chunk.len() as u64;
        }
        let actual = format!("{:x}", hasher.finalize());

        match expected_sha256 {
            Some(expected) if !expected.eq_ignore_ascii_case(&actual) => {
                return Err(AppError::Integrity(format!(
                    "{file_name}: expected sha256 {expected}, got {actual}"
                )));
            }
            Some(_) => debug!(sha256 = %actual, "checksum verified"),
            None => warn!(file_name, "no checksum published; skipping verification"),
        }

        tmp.as_file()
            .sync_all()
            .map_err(|err| AppError::Io(format!("failed to flush download: {err}")))?;
        let target = workdir.artifact_path();
        tmp.persist(&target).map_err(|err| {
            AppError::Io(format!("failed to move jar to {}: {err}", target.display()))
        })?;

        info!(path = %target.display(), bytes = downloaded, "server jar downloaded");
        Ok(())
    }

    fn seed_files(&self, workdir: &WorkingDirectory) -> Result<()> {
        workdir.accept_eula()?;

        let properties = workdir.properties_path();
        if properties.exists() {
            debug!(path = %properties.display(), "keeping existing server.properties");
        } else {
            write_atomic(&properties, default_properties(&self.rcon).as_bytes())?;
            info!(path = %properties.display(), "created server.properties");
        }
        Ok(())
    }
}

/// Remove a release directory created by a failed install.
fn discard_release_dir(workdir: &WorkingDirectory) {
    match std::fs::remove_dir_all(workdir.root()) {
        Ok(()) => debug!(path = %workdir.root().display(), "removed partial release"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            path = %workdir.root().display(),
            %err,
            "failed to remove partial release"
        ),
    }
}

/// Version strings go into URL paths and directory names.
fn validate_version(minecraft_version: &str) -> Result<()> {
    let valid = !minecraft_version.is_empty()
        && minecraft_version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        && !minecraft_version.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "invalid minecraft version '{minecraft_version}'"
        )))
    }
}
