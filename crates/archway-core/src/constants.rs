/// Executable name of the node daemon when run as a local binary.
pub const DAEMON_BINARY: &str = "archwayd";

/// Executable used for the containerised daemon.
pub const DOCKER_BINARY: &str = "docker";

/// Container image repository for the daemon.
pub const DOCKER_IMAGE: &str = "archwaynetwork/archwayd";

/// Image tag used when neither a version nor a testnet is configured.
pub const DEFAULT_DAEMON_VERSION: &str = "latest";

/// Daemon home as seen from inside the container.
pub const CONTAINER_HOME: &str = "/root/.archway";

/// Default host home directory (tilde expanded by the CLI).
pub const DEFAULT_HOME: &str = "~/.archway";

/// Keystore location used by earlier releases of the Docker wrapper.
pub const LEGACY_DOCKER_HOME: &str = "/var/tmp/.archwayd";

// ── Local chain bootstrap ────────────────────────────────────────────────────

/// Balance credited to every genesis account, in the chain's base denom.
pub const INITIAL_BALANCE: u128 = 1_000_000_000_000;

/// Auxiliary keys created alongside the validator key for local testing.
pub const TESTER_KEY_NAMES: [&str; 3] = ["tester1", "tester2", "tester3"];

/// Bech32 human-readable prefix of account addresses.
pub const ADDRESS_PREFIX: &str = "archway";

/// Keyring backend for keys and gentx. `file` is the backend that reads the
/// passphrase from stdin.
pub const DEFAULT_KEYRING_BACKEND: &str = "file";

/// Upper bound for a single captured daemon call.
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 120;

// ── On-disk layout under the daemon home ─────────────────────────────────────

pub const GENESIS_RELATIVE_PATH: &str = "config/genesis.json";
pub const DATA_DIR_NAME: &str = "data";
pub const SNAPSHOTS_DIR_NAME: &str = "snapshots";
pub const SNAPSHOT_FILE_PREFIX: &str = "chaindata_";
