use zeroize::Zeroizing;

use crate::error::ChainError;

/// Operator interaction used by commands that mutate local chain state.
///
/// The terminal implementation lives in the CLI; tests script the answers.
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question. `default` is the answer when the operator just
    /// presses enter.
    fn confirm(&self, message: &str, default: bool) -> Result<bool, ChainError>;

    /// Read a secret without echoing it.
    fn secret(&self, message: &str) -> Result<Zeroizing<String>, ChainError>;
}
