use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use archway_core::{ChainError, Step};
use archway_daemon::{ClientHandle, Invocation};

/// Collected output lines, for callers that render output themselves.
pub type LineBuffer = Arc<Mutex<Vec<String>>>;

/// Where a forwarded output stream goes.
#[derive(Debug, Clone)]
pub enum Sink {
    Stdout,
    Stderr,
    Lines(LineBuffer),
    Discard,
}

/// A daemon process whose output is forwarded as it arrives.
///
/// Dropping the handle kills the process.
pub struct AttachedProcess {
    step: Step,
    child: Child,
    forwarders: Vec<JoinHandle<()>>,
}

impl AttachedProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Block until the daemon exits and all forwarded output is flushed.
    pub async fn wait(&mut self) -> Result<ExitStatus, ChainError> {
        let status = self.child.wait().await.map_err(|e| ChainError::Process {
            step: self.step,
            message: format!("waiting for daemon: {e}"),
        })?;
        self.drain().await;
        if !status.success() {
            return Err(ChainError::Process {
                step: self.step,
                message: status.to_string(),
            });
        }
        Ok(status)
    }

    /// Stop the daemon. Output not yet forwarded is dropped: a grandchild
    /// may still hold the pipes open.
    pub async fn kill(&mut self) -> Result<(), ChainError> {
        self.child.kill().await.map_err(|e| ChainError::Process {
            step: self.step,
            message: format!("stopping daemon: {e}"),
        })?;
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        Ok(())
    }

    async fn drain(&mut self) {
        for forwarder in self.forwarders.drain(..) {
            let _ = forwarder.await;
        }
    }
}

/// `archwayd start`, forwarding stdout and stderr to the console.
pub fn start(client: &ClientHandle) -> Result<AttachedProcess, ChainError> {
    start_with(client, Sink::Stdout, Sink::Stderr)
}

pub fn start_with(
    client: &ClientHandle,
    stdout: Sink,
    stderr: Sink,
) -> Result<AttachedProcess, ChainError> {
    let mut args = vec!["start".to_string()];
    args.extend(client.home_args());
    info!(home = %client.home().display(), "starting local chain");
    spawn_attached(Step::Start, &client.invocation(args), stdout, stderr)
}

/// `archwayd unsafe-reset-all`: wipes block data but keeps config and keys.
/// The daemon reports progress on stderr, which is forwarded to stdout.
pub fn reset(client: &ClientHandle) -> Result<AttachedProcess, ChainError> {
    reset_with(client, Sink::Stdout)
}

pub fn reset_with(client: &ClientHandle, progress: Sink) -> Result<AttachedProcess, ChainError> {
    let mut args = vec!["unsafe-reset-all".to_string()];
    args.extend(client.home_args());
    info!(home = %client.home().display(), "resetting block data");
    spawn_attached(Step::UnsafeResetAll, &client.invocation(args), Sink::Discard, progress)
}

/// Spawn `invocation` and forward its output without waiting for it to exit.
pub fn spawn_attached(
    step: Step,
    invocation: &Invocation,
    stdout: Sink,
    stderr: Sink,
) -> Result<AttachedProcess, ChainError> {
    debug!(%step, command = %invocation, "spawning attached daemon");

    let mut command = invocation.command();
    command
        .stdin(Stdio::null())
        .stdout(stdio_for(&stdout))
        .stderr(stdio_for(&stderr))
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| ChainError::Process {
        step,
        message: format!("could not launch `{}`: {e}", invocation.program),
    })?;

    let mut forwarders = Vec::new();
    if let Some(out) = child.stdout.take() {
        forwarders.push(forward(out, stdout));
    }
    if let Some(err) = child.stderr.take() {
        forwarders.push(forward(err, stderr));
    }

    Ok(AttachedProcess {
        step,
        child,
        forwarders,
    })
}

fn stdio_for(sink: &Sink) -> Stdio {
    match sink {
        Sink::Discard => Stdio::null(),
        _ => Stdio::piped(),
    }
}

fn forward<R>(reader: R, sink: Sink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match &sink {
                Sink::Stdout => println!("{line}"),
                Sink::Stderr => eprintln!("{line}"),
                Sink::Lines(buf) => {
                    if let Ok(mut buf) = buf.lock() {
                        buf.push(line);
                    }
                }
                Sink::Discard => {}
            }
        }
    })
}
