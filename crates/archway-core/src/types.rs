use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::ChainError;

/// A key created in the daemon's keyring.
///
/// Only ever held in memory: the daemon owns the persisted copy. The
/// mnemonic buffer is wiped when the record is dropped.
#[derive(Clone)]
pub struct KeyRecord {
    pub name: String,
    /// Bech32 account address.
    pub address: String,
    /// Recovery phrase. Shown to the operator once, never logged.
    pub mnemonic: Zeroizing<String>,
}

impl KeyRecord {
    /// Number of words in the recovery phrase.
    pub fn mnemonic_words(&self) -> usize {
        self.mnemonic.split_whitespace().count()
    }
}

impl std::fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

/// `keys add --output json` as printed by the daemon. Extra fields
/// (`type`, `pubkey`) are ignored.
#[derive(Deserialize)]
pub struct KeyOutput {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub mnemonic: String,
}

impl From<KeyOutput> for KeyRecord {
    fn from(out: KeyOutput) -> Self {
        Self {
            name: out.name,
            address: out.address,
            mnemonic: Zeroizing::new(out.mnemonic),
        }
    }
}

/// Identity of a new local chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    /// Validator moniker; also the name of the validator key.
    pub moniker: String,
    pub chain_id: String,
    /// Base token denomination used for staking, minting, fees and deposits.
    pub denom: String,
}

impl ChainParams {
    /// Build params from optional CLI input. Blank values count as absent.
    pub fn from_options(
        moniker: Option<String>,
        chain_id: Option<String>,
        denom: Option<String>,
    ) -> Result<Self, ChainError> {
        Ok(Self {
            moniker: required(moniker, "moniker")?,
            chain_id: required(chain_id, "chain-id")?,
            denom: required(denom, "denom")?,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ChainError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ChainError::MissingParameter(name)),
    }
}

/// Progress of `chain new`, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChainStage {
    Unconfigured,
    Confirming,
    ProvisioningKeys,
    Initializing,
    PatchingGenesis,
    FundingAccounts,
    GeneratingGenTx,
    CollectingGenTx,
    Ready,
}

impl std::fmt::Display for ChainStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChainStage::Unconfigured => "validating parameters",
            ChainStage::Confirming => "confirming",
            ChainStage::ProvisioningKeys => "provisioning keys",
            ChainStage::Initializing => "initializing",
            ChainStage::PatchingGenesis => "patching genesis",
            ChainStage::FundingAccounts => "funding accounts",
            ChainStage::GeneratingGenTx => "generating gentx",
            ChainStage::CollectingGenTx => "collecting gentxs",
            ChainStage::Ready => "ready",
        };
        f.write_str(s)
    }
}
