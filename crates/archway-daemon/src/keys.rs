use tracing::{info, warn};

use archway_core::constants::ADDRESS_PREFIX;
use archway_core::{ChainError, KeyOutput, KeyRecord, Step};

use crate::client::ClientHandle;
use crate::runner::{DaemonRunner, ProcessOutput};

/// Create `name` in the daemon keyring and return its address and mnemonic.
///
/// The passphrase unlocks (or, on first use, creates) the keyring and is
/// passed on stdin. The daemon persists the key; nothing is written here.
pub async fn create_key(
    runner: &dyn DaemonRunner,
    client: &ClientHandle,
    name: &str,
    passphrase: &str,
) -> Result<KeyRecord, ChainError> {
    let mut args = vec!["keys".to_string(), "add".to_string(), name.to_string()];
    args.extend(client.home_args());
    args.extend(client.keyring_args());
    args.extend(["--output".to_string(), "json".to_string()]);

    let output = runner
        .run(Step::KeysAdd, &client.invocation(args), Some(passphrase))
        .await?;
    let key = parse_key_output(&output)?;

    if !key.address.starts_with(ADDRESS_PREFIX) {
        warn!(key = %key.name, address = %key.address, "unexpected address prefix");
    }
    info!(key = %key.name, address = %key.address, "key created");
    Ok(key)
}

/// Extract the key JSON from `keys add` output.
///
/// Some daemon releases print the JSON on stderr after the passphrase
/// prompt, so stderr is searched when stdout carries no object.
pub fn parse_key_output(output: &ProcessOutput) -> Result<KeyRecord, ChainError> {
    let json = json_object(&output.stdout)
        .or_else(|| json_object(&output.stderr))
        .ok_or_else(|| ChainError::Process {
            step: Step::KeysAdd,
            message: "no JSON key record in daemon output".into(),
        })?;

    let parsed: KeyOutput = serde_json::from_str(json).map_err(|e| ChainError::Process {
        step: Step::KeysAdd,
        message: format!("unparsable key record: {e}"),
    })?;

    if parsed.address.is_empty() || parsed.mnemonic.trim().is_empty() {
        return Err(ChainError::Process {
            step: Step::KeysAdd,
            message: format!("key record for {} is missing address or mnemonic", parsed.name),
        });
    }
    Ok(parsed.into())
}

fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
