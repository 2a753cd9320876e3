use console::style;
use dialoguer::{Confirm, Password};
use zeroize::Zeroizing;

use archway_chain::ChainBootstrap;
use archway_core::{ChainError, KeyRecord, Prompt};

/// Interactive prompts on the controlling terminal.
///
/// Prompts block on stdin, so they run through `block_in_place`; this needs
/// the multi-threaded runtime `main` starts.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, ChainError> {
        blocking(|| {
            Confirm::new()
                .with_prompt(style(message).red().to_string())
                .default(default)
                .interact_opt()
        })
        .map_err(|e| ChainError::Prompt(e.to_string()))?
        .ok_or(ChainError::UserCancelled)
    }

    fn secret(&self, message: &str) -> Result<Zeroizing<String>, ChainError> {
        blocking(|| Password::new().with_prompt(message).interact())
            .map(Zeroizing::new)
            .map_err(|e| ChainError::Prompt(e.to_string()))
    }
}

fn blocking<T>(f: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(f)
}

pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("[INFO]").cyan().bold(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("[WARN]").yellow().bold(), msg);
}

pub fn print_success(msg: &str) {
    eprintln!("{} {}", style("[OK]").green().bold(), msg);
}

/// Show the generated keys. This is the only time the mnemonics are shown.
pub fn print_bootstrap(chain: &ChainBootstrap) {
    print_success(&format!(
        "local chain {} initialised with denom {}",
        chain.params.chain_id, chain.params.denom
    ));
    println!("Genesis: {}", chain.genesis_path.display());
    println!();

    println!("{}", style("Validator Key").red());
    print_key(&chain.validator);
    println!();

    println!("{}", style("Test Keys").red());
    for key in &chain.testers {
        println!("===== ===== ===== ===== =====");
        print_key(key);
    }
    println!();
    print_warning("Store the mnemonics now; they cannot be shown again.");
}

fn print_key(key: &KeyRecord) {
    println!("name:     {}", key.name);
    println!("address:  {}", style(&key.address).yellow());
    println!("mnemonic: {}", style(key.mnemonic.as_str()).yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_prompt_leaves_runtime_running() {
        let ticker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            7
        });
        let answer = blocking(|| {
            std::thread::sleep(Duration::from_millis(50));
            42
        });
        assert_eq!(answer, 42);
        assert_eq!(ticker.await.unwrap(), 7);
    }

    #[test]
    fn blocking_works_outside_a_runtime() {
        assert_eq!(blocking(|| "yes"), "yes");
    }
}
