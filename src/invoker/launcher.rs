//! Child process creation and stream plumbing.

use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;

use super::{Accumulator, SpawnOptions};

/// How long output is still read after a killed child has exited.
///
/// Pipes inherited by a grandchild would otherwise keep the drains open.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Everything collected from a child once it has exited and both output
/// streams are closed.
#[derive(Debug)]
pub(crate) struct Collected {
    pub code: Option<i32>,
    pub stdout: Accumulator,
    pub stderr: Accumulator,
}

/// Spawn `program` with piped stdin, stdout and stderr.
pub(crate) fn launch(
    program: &str,
    argv: &[&str],
    options: &SpawnOptions,
    base_env: &HashMap<String, String>,
) -> std::io::Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(argv)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    options.apply(&mut cmd, base_env);

    cmd.spawn()
}

/// Feed stdin, drain both output streams and wait for exit.
///
/// Returns only after stdout and stderr reached EOF and the exit status is
/// known. If the child was killed or timed out, the drains stop
/// [`DRAIN_GRACE`] after it exited even without EOF.
pub(crate) async fn collect(
    mut child: Child,
    input: Option<Vec<u8>>,
    options: &SpawnOptions,
    cancel: CancellationToken,
) -> std::io::Result<Collected> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let forced = CancellationToken::new();

    let (_, stdout, stderr, status) = tokio::join!(
        feed_stdin(stdin, input),
        drain(stdout, &forced),
        drain(stderr, &forced),
        wait_or_kill(&mut child, options, &cancel, &forced),
    );

    Ok(Collected {
        code: status?.code(),
        stdout: stdout?,
        stderr: stderr?,
    })
}

async fn drain<R>(reader: Option<R>, forced: &CancellationToken) -> std::io::Result<Accumulator>
where
    R: AsyncRead + Unpin,
{
    let mut acc = Accumulator::new();
    let Some(mut reader) = reader else {
        return Ok(acc);
    };

    let finished = tokio::select! {
        result = acc.read_from(&mut reader) => Some(result),
        () = async {
            forced.cancelled().await;
            tokio::time::sleep(DRAIN_GRACE).await;
        } => None,
    };

    match finished {
        Some(result) => result?,
        None => tracing::debug!(bytes = acc.len(), "Stream still open after kill, giving up"),
    }
    Ok(acc)
}

/// Write the input, if any, then close stdin.
async fn feed_stdin(stdin: Option<ChildStdin>, input: Option<Vec<u8>>) {
    let Some(mut stdin) = stdin else {
        return;
    };

    if let Some(data) = input {
        if let Err(e) = stdin.write_all(&data).await {
            // The child may exit without reading its input.
            tracing::debug!(error = %e, bytes = data.len(), "Failed to write stdin");
        }
    }

    drop(stdin);
}

/// Wait for exit, killing on cancellation and signalling on timeout.
///
/// `forced` is cancelled once a killed or timed-out child has exited.
async fn wait_or_kill(
    child: &mut Child,
    options: &SpawnOptions,
    cancel: &CancellationToken,
    forced: &CancellationToken,
) -> std::io::Result<ExitStatus> {
    let deadline = async {
        match options.timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    let status = tokio::select! {
        status = child.wait() => return status,
        () = cancel.cancelled() => force_kill(child).await,
        () = deadline => {
            tracing::debug!(timeout = ?options.timeout, "Timed out, signalling child");
            signal_timeout(child, options);
            // The signal may be ignored; an explicit kill still applies.
            tokio::select! {
                status = child.wait() => status,
                () = cancel.cancelled() => force_kill(child).await,
            }
        }
    };

    forced.cancel();
    status
}

async fn force_kill(child: &mut Child) -> std::io::Result<ExitStatus> {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Kill failed, child already exited");
    }
    child.wait().await
}

#[cfg(unix)]
fn signal_timeout(child: &Child, options: &SpawnOptions) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let signal = options.kill_signal.unwrap_or(Signal::SIGTERM);
    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), signal) {
        tracing::debug!(error = %e, ?signal, "Failed to signal child");
    }
}

#[cfg(not(unix))]
fn signal_timeout(child: &mut Child, _options: &SpawnOptions) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Kill failed, child already exited");
    }
}
