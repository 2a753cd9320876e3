use std::path::{Path, PathBuf};

use archway_core::constants::{
    CONTAINER_HOME, DAEMON_BINARY, DATA_DIR_NAME, DEFAULT_DAEMON_VERSION, DEFAULT_KEYRING_BACKEND,
    DOCKER_BINARY, DOCKER_IMAGE, GENESIS_RELATIVE_PATH, SNAPSHOTS_DIR_NAME,
};

/// How the daemon executable is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKind {
    /// A daemon binary on the host, `archwayd` unless overridden.
    Binary { program: String },
    /// `docker run` of the published daemon image at `version`.
    Docker { version: String },
}

/// Immutable description of a daemon installation.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    kind: ClientKind,
    home: PathBuf,
    extra_args: Vec<String>,
    keyring_backend: String,
}

/// A fully resolved program + argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ClientHandle {
    /// Local `archwayd` using `home` as its home directory.
    pub fn binary(home: impl Into<PathBuf>) -> Self {
        Self::with_program(DAEMON_BINARY, home)
    }

    /// Local daemon at a custom path.
    pub fn with_program(program: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            kind: ClientKind::Binary {
                program: program.into(),
            },
            home: home.into(),
            extra_args: Vec::new(),
            keyring_backend: DEFAULT_KEYRING_BACKEND.to_string(),
        }
    }

    /// Containerised daemon. A testnet name, when present, selects the image
    /// tag; otherwise `version`, otherwise `latest`.
    pub fn docker(
        home: impl Into<PathBuf>,
        version: Option<String>,
        testnet: Option<String>,
    ) -> Self {
        let version = testnet
            .or(version)
            .unwrap_or_else(|| DEFAULT_DAEMON_VERSION.to_string());
        Self {
            kind: ClientKind::Docker { version },
            home: home.into(),
            extra_args: Vec::new(),
            keyring_backend: DEFAULT_KEYRING_BACKEND.to_string(),
        }
    }

    /// Arguments inserted before every subcommand.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Keyring backend passed to commands that touch keys.
    pub fn with_keyring_backend(mut self, backend: impl Into<String>) -> Self {
        self.keyring_backend = backend.into();
        self
    }

    pub fn keyring_backend(&self) -> &str {
        &self.keyring_backend
    }

    pub fn kind(&self) -> &ClientKind {
        &self.kind
    }

    pub fn is_docker(&self) -> bool {
        matches!(self.kind, ClientKind::Docker { .. })
    }

    /// Home directory on the host.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Home directory as the daemon process sees it.
    pub fn daemon_home(&self) -> String {
        match &self.kind {
            ClientKind::Binary { .. } => self.home.display().to_string(),
            ClientKind::Docker { .. } => CONTAINER_HOME.to_string(),
        }
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.home.join(GENESIS_RELATIVE_PATH)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.home.join(DATA_DIR_NAME)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.home.join(SNAPSHOTS_DIR_NAME)
    }

    /// `--home <daemon_home>`, appended to every subcommand this tool runs.
    pub fn home_args(&self) -> [String; 2] {
        ["--home".to_string(), self.daemon_home()]
    }

    /// `--keyring-backend <backend>`, for `keys add` and `gentx`.
    pub fn keyring_args(&self) -> [String; 2] {
        ["--keyring-backend".to_string(), self.keyring_backend.clone()]
    }

    /// Resolve `args` (subcommand first) into a program invocation.
    pub fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (program, mut full) = match &self.kind {
            ClientKind::Binary { program } => (program.clone(), Vec::new()),
            ClientKind::Docker { version } => (
                DOCKER_BINARY.to_string(),
                vec![
                    "run".to_string(),
                    "--rm".to_string(),
                    "-i".to_string(),
                    format!("--volume={}:{}", self.home.display(), CONTAINER_HOME),
                    format!("{DOCKER_IMAGE}:{version}"),
                ],
            ),
        };
        full.extend(self.extra_args.iter().cloned());
        full.extend(args.into_iter().map(Into::into));
        Invocation {
            program,
            args: full,
        }
    }
}

impl Invocation {
    /// A tokio command for this invocation; stdio is left to the caller.
    pub fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Whether `arg` appears verbatim in the argument list.
    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_invocation_puts_extra_args_before_subcommand() {
        let client = ClientHandle::binary("/home/dev/.archway")
            .with_extra_args(vec!["--log_level".into(), "error".into()]);
        let inv = client.invocation(["init", "validator"]);
        assert_eq!(inv.program, "archwayd");
        assert_eq!(inv.args, ["--log_level", "error", "init", "validator"]);
        assert_eq!(client.daemon_home(), "/home/dev/.archway");
    }

    #[test]
    fn docker_invocation_mounts_home() {
        let client = ClientHandle::docker("/home/dev/.archway", Some("v0.0.5".into()), None);
        let inv = client.invocation(["keys", "list"]);
        assert_eq!(inv.program, "docker");
        assert_eq!(
            inv.args,
            [
                "run",
                "--rm",
                "-i",
                "--volume=/home/dev/.archway:/root/.archway",
                "archwaynetwork/archwayd:v0.0.5",
                "keys",
                "list",
            ]
        );
        assert_eq!(client.home_args(), ["--home", "/root/.archway"]);
    }

    #[test]
    fn docker_testnet_overrides_version() {
        let client = ClientHandle::docker("/tmp/h", Some("v1".into()), Some("constantine".into()));
        assert_eq!(
            client.kind(),
            &ClientKind::Docker {
                version: "constantine".into()
            }
        );
        let client = ClientHandle::docker("/tmp/h", None, None);
        assert_eq!(client.kind(), &ClientKind::Docker { version: "latest".into() });
    }

    #[test]
    fn host_paths_live_under_home() {
        let client = ClientHandle::docker("/srv/chain", None, None);
        assert_eq!(client.genesis_path(), PathBuf::from("/srv/chain/config/genesis.json"));
        assert_eq!(client.data_dir(), PathBuf::from("/srv/chain/data"));
        assert_eq!(client.snapshots_dir(), PathBuf::from("/srv/chain/snapshots"));
    }

    #[test]
    fn keyring_backend_defaults_to_file() {
        let client = ClientHandle::binary("/h");
        assert_eq!(client.keyring_args(), ["--keyring-backend", "file"]);
        let client = client.with_keyring_backend("test");
        assert_eq!(client.keyring_backend(), "test");
        assert_eq!(client.keyring_args(), ["--keyring-backend", "test"]);
    }

    #[test]
    fn invocation_display_is_shell_like() {
        let inv = ClientHandle::binary("/h").invocation(["start", "--home", "/h"]);
        assert_eq!(inv.to_string(), "archwayd start --home /h");
    }
}
