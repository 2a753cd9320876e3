use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use zeroize::Zeroizing;

use archway_core::constants::DEFAULT_STEP_TIMEOUT_SECS;
use archway_core::{ChainError, Step};

use crate::client::Invocation;

/// Captured output of a finished daemon call.
///
/// `keys add` output carries a mnemonic, so both buffers are wiped on drop.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

impl Drop for ProcessOutput {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.stdout.zeroize();
        self.stderr.zeroize();
    }
}

/// Runs one daemon subcommand to completion.
///
/// Calls are strictly sequential: the daemon home is shared mutable state
/// (keyring, genesis file), so callers never run two at once.
#[async_trait]
pub trait DaemonRunner: Send + Sync {
    /// Run `invocation`, feeding `secret` (if any) on stdin. A non-zero exit
    /// is an error carrying the captured stderr.
    async fn run(
        &self,
        step: Step,
        invocation: &Invocation,
        secret: Option<&str>,
    ) -> Result<ProcessOutput, ChainError>;
}

/// Spawns real processes through tokio.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_STEP_TIMEOUT_SECS))
    }
}

#[async_trait]
impl DaemonRunner for ProcessRunner {
    async fn run(
        &self,
        step: Step,
        invocation: &Invocation,
        secret: Option<&str>,
    ) -> Result<ProcessOutput, ChainError> {
        // The secret travels on stdin only; never put it in the log line.
        debug!(%step, command = %invocation, with_stdin = secret.is_some(), "running daemon");

        let mut command = invocation.command();
        command
            .stdin(if secret.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| ChainError::Process {
            step,
            message: format!("could not launch `{}`: {e}", invocation.program),
        })?;

        if let (Some(secret), Some(mut stdin)) = (secret, child.stdin.take()) {
            // Keyring creation asks for the passphrase twice; later calls read
            // one line and ignore the rest.
            let input = Zeroizing::new(format!("{secret}\n{secret}\n"));
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(ChainError::Process {
                        step,
                        message: format!("writing to stdin: {e}"),
                    });
                }
            }
            drop(stdin);
        }

        // Dropping the child on timeout kills it (kill_on_drop).
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ChainError::Timeout {
                step,
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ChainError::Process {
                step,
                message: format!("waiting for `{}`: {e}", invocation.program),
            })?;

        let status = output.status;
        let stdout = into_text(output.stdout);
        let stderr = into_text(output.stderr);

        if !status.success() {
            let message = match stderr.trim() {
                "" => status.to_string(),
                trimmed => format!("{} ({})", trimmed, status),
            };
            return Err(ChainError::Process { step, message });
        }

        debug!(%step, "daemon call finished");
        Ok(ProcessOutput { stdout, stderr })
    }
}

/// Decode captured output. The raw buffer may hold a mnemonic and is wiped
/// once converted.
fn into_text(raw: Vec<u8>) -> String {
    let raw = Zeroizing::new(raw);
    String::from_utf8_lossy(&raw).into_owned()
}
