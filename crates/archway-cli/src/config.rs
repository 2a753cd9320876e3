use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use archway_daemon::ClientHandle;

/// The parts of a project's `archway.json` this tool reads. Everything else
/// in the file is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub developer: DeveloperConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkConfig {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeveloperConfig {
    #[serde(default)]
    pub archwayd: DaemonConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct DaemonConfig {
    pub docker: Option<bool>,
    pub version: Option<String>,
}

impl ProjectConfig {
    /// Load `path`; a missing file is not an error.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    /// Image tag for the Docker daemon: the explicit version, else the
    /// network name unless it is the local network.
    pub fn daemon_version(&self) -> Option<String> {
        self.developer.archwayd.version.clone().or_else(|| {
            self.network
                .name
                .clone()
                .filter(|name| name != "local")
        })
    }
}

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone)]
pub struct Overrides {
    pub home: PathBuf,
    pub docker: bool,
    pub version: Option<String>,
    pub program: String,
    pub extra_args: Vec<String>,
    pub keyring_backend: String,
    pub timeout_secs: u64,
}

/// Fully resolved invocation settings: flags, then `archway.json`, then
/// built-in defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub docker: bool,
    pub version: Option<String>,
    pub program: String,
    pub extra_args: Vec<String>,
    pub keyring_backend: String,
    pub timeout: Duration,
}

impl Settings {
    pub fn resolve(cli: Overrides, project: Option<&ProjectConfig>) -> Self {
        let docker = cli.docker
            || project
                .and_then(|p| p.developer.archwayd.docker)
                .unwrap_or(false);
        let version = cli
            .version
            .or_else(|| project.and_then(ProjectConfig::daemon_version));
        Self {
            home: expand_tilde(&cli.home),
            docker,
            version,
            program: cli.program,
            extra_args: cli.extra_args,
            keyring_backend: cli.keyring_backend,
            timeout: Duration::from_secs(cli.timeout_secs),
        }
    }

    pub fn client(&self) -> ClientHandle {
        let client = if self.docker {
            ClientHandle::docker(&self.home, self.version.clone(), None)
        } else {
            ClientHandle::with_program(&self.program, &self.home)
        };
        client
            .with_extra_args(self.extra_args.clone())
            .with_keyring_backend(&self.keyring_backend)
    }
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use archway_daemon::ClientKind;

    fn overrides() -> Overrides {
        Overrides {
            home: PathBuf::from("/srv/archway"),
            docker: false,
            version: None,
            program: "archwayd".into(),
            extra_args: vec![],
            keyring_backend: "file".into(),
            timeout_secs: 120,
        }
    }

    fn project(json: &str) -> ProjectConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_to_local_binary() {
        let settings = Settings::resolve(overrides(), None);
        assert!(!settings.docker);
        assert_eq!(
            settings.client().kind(),
            &ClientKind::Binary {
                program: "archwayd".into()
            }
        );
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.client().keyring_backend(), "file");
    }

    #[test]
    fn project_file_enables_docker_and_version() {
        let cfg = project(
            r#"{"name":"demo","network":{"name":"constantine"},"developer":{"archwayd":{"docker":true}}}"#,
        );
        let settings = Settings::resolve(overrides(), Some(&cfg));
        assert!(settings.docker);
        assert_eq!(settings.version.as_deref(), Some("constantine"));
        assert_eq!(
            settings.client().kind(),
            &ClientKind::Docker {
                version: "constantine".into()
            }
        );
    }

    #[test]
    fn local_network_is_not_an_image_tag() {
        let cfg = project(r#"{"network":{"name":"local"}}"#);
        assert_eq!(cfg.daemon_version(), None);
        let cfg = project(r#"{"network":{"name":"local"},"developer":{"archwayd":{"version":"v0.2.0"}}}"#);
        assert_eq!(cfg.daemon_version().as_deref(), Some("v0.2.0"));
    }

    #[test]
    fn flags_win_over_project_file() {
        let cfg = project(r#"{"developer":{"archwayd":{"docker":false,"version":"v0.1.0"}}}"#);
        let mut cli = overrides();
        cli.docker = true;
        cli.version = Some("v0.3.0".into());
        let settings = Settings::resolve(cli, Some(&cfg));
        assert!(settings.docker);
        assert_eq!(settings.version.as_deref(), Some("v0.3.0"));
    }

    #[test]
    fn missing_project_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectConfig::load(&dir.path().join("archway.json")).unwrap().is_none());
    }

    #[test]
    fn malformed_project_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archway.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ProjectConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                expand_tilde(Path::new("~/.archway")),
                PathBuf::from(home).join(".archway")
            );
        }
        assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    }
}
