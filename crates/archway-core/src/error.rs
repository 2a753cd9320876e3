use std::path::PathBuf;

use thiserror::Error;

use crate::types::ChainStage;

/// Daemon subcommand a process failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    KeysAdd,
    Init,
    AddGenesisAccount,
    GenTx,
    CollectGenTxs,
    Start,
    UnsafeResetAll,
}

impl Step {
    /// The daemon subcommand, as typed on the command line.
    pub fn subcommand(&self) -> &'static str {
        match self {
            Step::KeysAdd => "keys add",
            Step::Init => "init",
            Step::AddGenesisAccount => "add-genesis-account",
            Step::GenTx => "gentx",
            Step::CollectGenTxs => "collect-gentxs",
            Step::Start => "start",
            Step::UnsafeResetAll => "unsafe-reset-all",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subcommand())
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    // ── Input / operator ─────────────────────────────────────────────────────
    #[error("missing required parameter: --{0}")]
    MissingParameter(&'static str),

    #[error("operation cancelled by user")]
    UserCancelled,

    #[error("prompt failed: {0}")]
    Prompt(String),

    // ── Daemon processes ─────────────────────────────────────────────────────
    #[error("`{step}` failed: {message}")]
    Process { step: Step, message: String },

    #[error("`{step}` did not finish within {secs}s")]
    Timeout { step: Step, secs: u64 },

    // ── Genesis document ─────────────────────────────────────────────────────
    #[error("genesis file not found at {}", .0.display())]
    GenesisNotFound(PathBuf),

    #[error("could not read genesis file {}: {source}", path.display())]
    GenesisRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("genesis file {} is not valid JSON: {source}", path.display())]
    GenesisParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("genesis file {} has no field at {pointer}", path.display())]
    GenesisField { path: PathBuf, pointer: String },

    #[error("could not write genesis file {}: {source}", path.display())]
    GenesisWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Bootstrap sequencing ─────────────────────────────────────────────────
    #[error("funding genesis accounts failed for: {}", failed.join(", "))]
    Funding { failed: Vec<String> },

    #[error("chain bootstrap failed while {stage}: {source}")]
    Stage {
        stage: ChainStage,
        #[source]
        source: Box<ChainError>,
    },

    // ── Snapshots ────────────────────────────────────────────────────────────
    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

impl ChainError {
    /// Tag an error with the bootstrap stage it surfaced in.
    pub fn at(self, stage: ChainStage) -> Self {
        match self {
            // Already attributed; cancellations are not failures of a stage.
            e @ (ChainError::Stage { .. } | ChainError::UserCancelled) => e,
            e => ChainError::Stage {
                stage,
                source: Box::new(e),
            },
        }
    }

    /// The innermost error, skipping stage attribution.
    pub fn root(&self) -> &ChainError {
        match self {
            ChainError::Stage { source, .. } => source.root(),
            e => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_attribution_is_applied_once() {
        let err = ChainError::Process {
            step: Step::Init,
            message: "exit status: 1".into(),
        }
        .at(ChainStage::Initializing)
        .at(ChainStage::PatchingGenesis);

        match &err {
            ChainError::Stage { stage, .. } => assert_eq!(*stage, ChainStage::Initializing),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root(), ChainError::Process { step: Step::Init, .. }));
        assert_eq!(
            err.to_string(),
            "chain bootstrap failed while initializing: `init` failed: exit status: 1"
        );
    }

    #[test]
    fn cancellation_is_never_wrapped() {
        let err = ChainError::UserCancelled.at(ChainStage::Confirming);
        assert!(matches!(err, ChainError::UserCancelled));
    }
}
