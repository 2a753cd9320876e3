//! archway
//!
//! Developer CLI for Archway. This binary covers the local chain commands,
//! which drive a local or Dockerised `archwayd`.
//!
//! Usage:
//!   archway chain new       --moniker <name> --chain-id <id> --denom <denom>
//!   archway chain start
//!   archway chain reset
//!   archway chain snapshot
//!
//! Global flags select the daemon: `--home`, `--docker`, `--archwayd-version`,
//! `--archwayd <path>`, `--flags "<extra args>"`, `--timeout-secs`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use archway_chain::{lifecycle, make_snapshot, ChainInitializer};
use archway_core::constants::{
    DAEMON_BINARY, DEFAULT_HOME, DEFAULT_KEYRING_BACKEND, DEFAULT_STEP_TIMEOUT_SECS,
    LEGACY_DOCKER_HOME,
};
use archway_core::{ChainError, ChainParams, ChainStage};
use archway_daemon::legacy::migrate_legacy_home;
use archway_daemon::{ClientHandle, ProcessRunner};

mod config;
mod terminal;

use config::{Overrides, ProjectConfig, Settings};
use terminal::TerminalPrompt;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "archway", version, about = "Archway developer CLI — local chain tooling")]
struct Args {
    /// Daemon home directory (keyring, config, data).
    #[arg(long, global = true, default_value = DEFAULT_HOME)]
    home: PathBuf,

    /// Use the Docker image of archwayd instead of a local binary.
    #[arg(short = 'k', long, global = true)]
    docker: bool,

    /// Docker image tag of archwayd.
    #[arg(long, global = true)]
    archwayd_version: Option<String>,

    /// Path of the local archwayd binary.
    #[arg(long, global = true, default_value = DAEMON_BINARY)]
    archwayd: String,

    /// Keyring backend for key creation and gentx; `file` reads the passphrase from stdin.
    #[arg(long, global = true, default_value = DEFAULT_KEYRING_BACKEND)]
    keyring_backend: String,

    /// Extra arguments passed to archwayd before the subcommand, e.g. "--log_level error".
    #[arg(long, global = true, allow_hyphen_values = true, value_delimiter = ' ')]
    flags: Vec<String>,

    /// Upper bound in seconds for each daemon call during `chain new`.
    #[arg(long, global = true, default_value_t = DEFAULT_STEP_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Project configuration file.
    #[arg(long, global = true, default_value = "archway.json")]
    config: PathBuf,

    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manipulate the local chain.
    #[command(subcommand)]
    Chain(ChainCommand),
}

#[derive(Subcommand, Debug)]
enum ChainCommand {
    /// Create a new local chain: keys, genesis, validator gentx.
    New {
        /// Moniker of the new local chain; also the validator key name.
        #[arg(short, long)]
        moniker: Option<String>,
        /// Chain ID.
        #[arg(short, long)]
        chain_id: Option<String>,
        /// Base denomination for staking, minting, fees and deposits.
        #[arg(short, long)]
        denom: Option<String>,
    },

    /// Start the local chain and follow its output until it exits or Ctrl-C.
    Start,

    /// Delete the current chain data (keeps config and keys).
    Reset,

    /// Archive the current chain data into <home>/snapshots.
    Snapshot,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "warn,archway=debug"
    } else {
        "warn,archway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let project = ProjectConfig::load(&args.config)?;
    let settings = Settings::resolve(
        Overrides {
            home: args.home,
            docker: args.docker,
            version: args.archwayd_version,
            program: args.archwayd,
            extra_args: args.flags,
            keyring_backend: args.keyring_backend,
            timeout_secs: args.timeout_secs,
        },
        project.as_ref(),
    );
    let client = settings.client();
    let prompt = TerminalPrompt;

    migrate_legacy_home(&client, &prompt, Path::new(LEGACY_DOCKER_HOME));

    match args.command {
        Command::Chain(cmd) => run_chain(cmd, &client, &settings, &prompt).await,
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run_chain(
    cmd: ChainCommand,
    client: &ClientHandle,
    settings: &Settings,
    prompt: &TerminalPrompt,
) -> anyhow::Result<()> {
    match cmd {
        ChainCommand::New { moniker, chain_id, denom } => {
            let params = ChainParams::from_options(moniker, chain_id, denom)?;
            let runner = ProcessRunner::new(settings.timeout);
            let mut init = ChainInitializer::new(&runner, client, prompt);

            let outcome = init.run(params).await;
            match outcome {
                Ok(chain) => {
                    terminal::print_bootstrap(&chain);
                    Ok(())
                }
                Err(ChainError::UserCancelled) => {
                    terminal::print_warning("bye");
                    Ok(())
                }
                Err(e) => {
                    let stage = init.stage();
                    if stage >= ChainStage::Initializing {
                        terminal::print_warning(&format!(
                            "{} may be half written; remove it before running `chain new` again",
                            client.home().join("config").display()
                        ));
                    }
                    Err(e.into())
                }
            }
        }

        ChainCommand::Start => {
            terminal::print_info("Local chain start");
            let mut process = lifecycle::start(client)?;
            let interrupted = tokio::select! {
                status = process.wait() => {
                    status?;
                    false
                }
                _ = tokio::signal::ctrl_c() => true,
            };
            if interrupted {
                info!("interrupted; stopping local chain");
                process.kill().await?;
            }
            Ok(())
        }

        ChainCommand::Reset => {
            terminal::print_info("Reset block data");
            lifecycle::reset(client)?.wait().await?;
            Ok(())
        }

        ChainCommand::Snapshot => {
            let path = make_snapshot(client).await?;
            terminal::print_success(&format!("snapshot written to {}", path.display()));
            Ok(())
        }
    }
}
