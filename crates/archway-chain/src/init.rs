use std::path::PathBuf;

use tracing::{info, warn};

use archway_core::constants::{INITIAL_BALANCE, TESTER_KEY_NAMES};
use archway_core::{ChainError, ChainParams, ChainStage, KeyRecord, Prompt, Step};
use archway_daemon::{create_key, ClientHandle, DaemonRunner};
use archway_genesis::patch_genesis;

/// Amounts and key names used when bootstrapping a local chain.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    /// Genesis balance of every key, in the chain denom.
    pub initial_balance: u128,
    /// Amount the validator self-delegates in its gentx.
    pub self_delegation: u128,
    /// Auxiliary keys created and funded next to the validator.
    pub tester_names: Vec<String>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            initial_balance: INITIAL_BALANCE,
            self_delegation: INITIAL_BALANCE,
            tester_names: TESTER_KEY_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// Outcome of the genesis-account step, one entry per key.
#[derive(Debug, Default)]
pub struct FundingReport {
    pub funded: Vec<String>,
    pub failed: Vec<(String, ChainError)>,
}

impl FundingReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a successful `chain new`.
///
/// The mnemonics are secrets: display them once and drop the value.
#[derive(Debug)]
pub struct ChainBootstrap {
    pub params: ChainParams,
    pub validator: KeyRecord,
    pub testers: Vec<KeyRecord>,
    pub genesis_path: PathBuf,
}

/// Drives `chain new` from parameter validation to a ready genesis file.
///
/// There is no rollback: `archwayd init` refuses to run twice, so after a
/// failure past `Initializing` the operator resets the chain and starts over.
pub struct ChainInitializer<'a> {
    runner: &'a dyn DaemonRunner,
    client: &'a ClientHandle,
    prompt: &'a dyn Prompt,
    options: ChainOptions,
    stage: ChainStage,
}

impl<'a> ChainInitializer<'a> {
    pub fn new(
        runner: &'a dyn DaemonRunner,
        client: &'a ClientHandle,
        prompt: &'a dyn Prompt,
    ) -> Self {
        Self {
            runner,
            client,
            prompt,
            options: ChainOptions::default(),
            stage: ChainStage::Unconfigured,
        }
    }

    pub fn with_options(mut self, options: ChainOptions) -> Self {
        self.options = options;
        self
    }

    /// Stage reached so far; after a failure, the stage that failed.
    pub fn stage(&self) -> ChainStage {
        self.stage
    }

    fn enter(&mut self, stage: ChainStage) {
        info!(%stage, "chain new");
        self.stage = stage;
    }

    /// Run the whole bootstrap sequence.
    ///
    /// Declining the confirmation returns `UserCancelled` before any daemon
    /// call is made.
    pub async fn run(&mut self, params: ChainParams) -> Result<ChainBootstrap, ChainError> {
        self.enter(ChainStage::Confirming);
        let proceed = self.prompt.confirm(
            "This step will reset local chain configuration. Proceed?",
            false,
        )?;
        if !proceed {
            return Err(ChainError::UserCancelled);
        }
        let passphrase = self.prompt.secret("Keyring passphrase")?;

        // ── Keys ─────────────────────────────────────────────────────────────
        // One at a time: concurrent writers corrupt the keyring file.
        self.enter(ChainStage::ProvisioningKeys);
        let validator = create_key(self.runner, self.client, &params.moniker, &passphrase)
            .await
            .map_err(|e| e.at(self.stage))?;
        let mut testers = Vec::with_capacity(self.options.tester_names.len());
        for name in &self.options.tester_names {
            let key = create_key(self.runner, self.client, name, &passphrase)
                .await
                .map_err(|e| e.at(self.stage))?;
            testers.push(key);
        }

        // ── Chain config ─────────────────────────────────────────────────────
        self.enter(ChainStage::Initializing);
        let mut args = vec![
            "init".to_string(),
            params.moniker.clone(),
            "--chain-id".to_string(),
            params.chain_id.clone(),
        ];
        args.extend(self.client.home_args());
        self.runner
            .run(Step::Init, &self.client.invocation(args), None)
            .await
            .map_err(|e| e.at(self.stage))?;

        self.enter(ChainStage::PatchingGenesis);
        let genesis_path = self.client.genesis_path();
        patch_genesis(&genesis_path, &params.denom).map_err(|e| e.at(self.stage))?;

        // ── Genesis accounts ─────────────────────────────────────────────────
        self.enter(ChainStage::FundingAccounts);
        let keys: Vec<&KeyRecord> = std::iter::once(&validator).chain(testers.iter()).collect();
        let report = self.fund_accounts(&keys, &params.denom).await;
        if !report.is_complete() {
            let failed = report.failed.into_iter().map(|(name, _)| name).collect();
            return Err(ChainError::Funding { failed }.at(self.stage));
        }

        // ── Validator registration ───────────────────────────────────────────
        self.enter(ChainStage::GeneratingGenTx);
        let mut args = vec![
            "gentx".to_string(),
            params.moniker.clone(),
            format!("{}{}", self.options.self_delegation, params.denom),
            "--chain-id".to_string(),
            params.chain_id.clone(),
        ];
        args.extend(self.client.home_args());
        args.extend(self.client.keyring_args());
        self.runner
            .run(Step::GenTx, &self.client.invocation(args), Some(passphrase.as_str()))
            .await
            .map_err(|e| e.at(self.stage))?;

        self.enter(ChainStage::CollectingGenTx);
        let mut args = vec!["collect-gentxs".to_string()];
        args.extend(self.client.home_args());
        self.runner
            .run(Step::CollectGenTxs, &self.client.invocation(args), None)
            .await
            .map_err(|e| e.at(self.stage))?;

        self.enter(ChainStage::Ready);
        Ok(ChainBootstrap {
            params,
            validator,
            testers,
            genesis_path,
        })
    }

    /// Add a genesis account for every key. Every key is attempted even when
    /// an earlier one fails.
    async fn fund_accounts(&self, keys: &[&KeyRecord], denom: &str) -> FundingReport {
        let amount = format!("{}{}", self.options.initial_balance, denom);
        let mut report = FundingReport::default();

        for key in keys {
            let mut args = vec![
                "add-genesis-account".to_string(),
                key.address.clone(),
                amount.clone(),
            ];
            args.extend(self.client.home_args());
            args.extend(["--output".to_string(), "json".to_string()]);

            match self
                .runner
                .run(Step::AddGenesisAccount, &self.client.invocation(args), None)
                .await
            {
                Ok(_) => {
                    info!(key = %key.name, %amount, "genesis account added");
                    report.funded.push(key.name.clone());
                }
                Err(e) => {
                    warn!(key = %key.name, error = %e, "genesis account failed");
                    report.failed.push((key.name.clone(), e));
                }
            }
        }
        report
    }
}
