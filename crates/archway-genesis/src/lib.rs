//! archway-genesis
//!
//! Rewrites the denomination fields of a freshly initialised
//! `config/genesis.json` so every module agrees on the chain's base token.
//!
//! `archwayd init` writes `stake` (or its own default) into four places:
//!
//!   app_state.crisis.constant_fee.denom
//!   app_state.gov.deposit_params.min_deposit[0].denom
//!   app_state.mint.params.mint_denom
//!   app_state.staking.params.bond_denom
//!
//! All four must equal the chain denom before any gentx is generated, or the
//! daemon will reject the chain later. Everything else in the document is
//! passed through untouched, key order included.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use archway_core::ChainError;

/// JSON pointers of the denom fields, in document order.
pub const DENOM_POINTERS: [&str; 4] = [
    "/app_state/crisis/constant_fee/denom",
    "/app_state/gov/deposit_params/min_deposit/0/denom",
    "/app_state/mint/params/mint_denom",
    "/app_state/staking/params/bond_denom",
];

/// Genesis file location under a daemon home.
pub fn genesis_path(home: &Path) -> PathBuf {
    home.join(archway_core::constants::GENESIS_RELATIVE_PATH)
}

/// Set every denom field of the genesis file at `path` to `denom`.
///
/// Idempotent: a second call with the same denom rewrites identical bytes.
pub fn patch_genesis(path: &Path, denom: &str) -> Result<(), ChainError> {
    let mut genesis = read_genesis(path)?;
    set_denoms(&mut genesis, path, denom)?;
    write_genesis(path, &genesis)?;

    info!(path = %path.display(), denom, "genesis denoms patched");
    Ok(())
}

/// Current values of the four denom fields, in `DENOM_POINTERS` order.
pub fn read_denoms(path: &Path) -> Result<Vec<String>, ChainError> {
    let genesis = read_genesis(path)?;
    DENOM_POINTERS
        .iter()
        .map(|pointer| {
            genesis
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| missing(path, pointer))
        })
        .collect()
}

fn read_genesis(path: &Path) -> Result<Value, ChainError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ChainError::GenesisNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(ChainError::GenesisRead {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|e| ChainError::GenesisParse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_genesis(path: &Path, genesis: &Value) -> Result<(), ChainError> {
    let json = serde_json::to_string_pretty(genesis).map_err(|e| ChainError::GenesisParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ChainError::GenesisWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Check every pointer before touching any, so a malformed document is never
/// half patched.
fn set_denoms(genesis: &mut Value, path: &Path, denom: &str) -> Result<(), ChainError> {
    if let Some(pointer) = DENOM_POINTERS
        .iter()
        .find(|p| genesis.pointer(p).is_none())
    {
        return Err(missing(path, pointer));
    }
    for pointer in DENOM_POINTERS {
        if let Some(slot) = genesis.pointer_mut(pointer) {
            debug!(pointer, from = %slot, to = denom, "patching denom");
            *slot = Value::String(denom.to_string());
        }
    }
    Ok(())
}

fn missing(path: &Path, pointer: &str) -> ChainError {
    ChainError::GenesisField {
        path: path.to_path_buf(),
        pointer: pointer.to_string(),
    }
}
