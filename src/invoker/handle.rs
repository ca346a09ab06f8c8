//! Handle to a launched invocation.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Caller-side view of one invocation.
///
/// The invoker keeps ownership of the child's streams and exit status; the
/// handle only exposes identity and termination.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Option<u32>, cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { pid, cancel, task }
    }

    /// OS process ID, or `None` if the executable could not be launched.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the completion callback has already run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Forcefully kill the child.
    ///
    /// The invocation still completes normally afterwards and reports a
    /// failure with no exit code. Calling this after completion does nothing.
    pub fn kill(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(pid = ?self.pid, "Kill requested");
        }
        self.cancel.cancel();
    }

    /// Send a signal to the child.
    ///
    /// # Errors
    ///
    /// Returns an error if the process was never launched, has already
    /// completed, or the signal cannot be delivered.
    #[cfg(unix)]
    pub fn signal(&self, signal: nix::sys::signal::Signal) -> std::io::Result<()> {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let pid = match self.pid {
            Some(pid) if !self.is_finished() => pid,
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "process is not running",
                ))
            }
        };

        let raw = i32::try_from(pid)
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range"))?;
        kill(Pid::from_raw(raw), signal).map_err(std::io::Error::from)
    }

    /// Wait until the invocation has completed and its callback has run.
    ///
    /// # Errors
    ///
    /// Returns an error if the callback panicked.
    pub async fn finished(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}
