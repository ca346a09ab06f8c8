//! Invocation lifecycle: validate, spawn, stream, finalize.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::config::InvokerConfig;

use super::launcher::{collect, launch, Collected};
use super::{
    classify, resolve_args, Arg, ArgumentError, InvocationRequest, InvokeError, ProcessHandle,
    SpawnOptions, Verdict,
};

/// Completion callback: `(error, stdout)`.
///
/// `error` is `None` on success. `stdout` is the decoded standard output,
/// also passed on failure.
pub type Callback = Box<dyn FnOnce(Option<InvokeError>, String) + Send + 'static>;

/// Launches the OpenSSL executable and classifies its result.
///
/// Invocations are independent; one `Invoker` can serve any number of
/// concurrent calls. All entry points must be called from within a Tokio
/// runtime.
#[derive(Debug, Clone)]
pub struct Invoker {
    program: String,
    env: HashMap<String, String>,
}

impl Invoker {
    /// Create an invoker from configuration.
    #[must_use]
    pub fn new(config: InvokerConfig) -> Self {
        Self {
            program: config.program,
            env: config.env,
        }
    }

    /// Use a different executable (for testing or non-standard installs).
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self::new(InvokerConfig {
            program: program.into(),
            ..InvokerConfig::default()
        })
    }

    /// Executable this invoker launches.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `command_line` without input.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::InvalidArgument` if the command line is blank.
    /// Nothing is spawned in that case.
    pub fn invoke(
        &self,
        command_line: &str,
        options: SpawnOptions,
        callback: Option<Callback>,
    ) -> Result<ProcessHandle, ArgumentError> {
        let request = InvocationRequest::new(command_line, None, options)?;
        Ok(self.start(request, callback))
    }

    /// Run `command_line`, writing `input` to the child's stdin.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::InvalidArgument` if the command line is blank.
    /// Nothing is spawned in that case.
    pub fn invoke_with_input(
        &self,
        command_line: &str,
        input: impl Into<Vec<u8>>,
        options: SpawnOptions,
        callback: Option<Callback>,
    ) -> Result<ProcessHandle, ArgumentError> {
        let request = InvocationRequest::new(command_line, Some(input.into()), options)?;
        Ok(self.start(request, callback))
    }

    /// Run from positional arguments whose shapes are checked at runtime.
    ///
    /// See [`resolve_args`] for the accepted shapes.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::InvalidArgument` naming the offending slot.
    /// Nothing is spawned in that case.
    pub fn invoke_args(
        &self,
        args: Vec<Arg>,
        callback: Option<Callback>,
    ) -> Result<ProcessHandle, ArgumentError> {
        let request = resolve_args(args)?;
        Ok(self.start(request, callback))
    }

    /// Spawn a validated request and drive it to completion on a task.
    pub fn start(&self, request: InvocationRequest, callback: Option<Callback>) -> ProcessHandle {
        let cancel = CancellationToken::new();
        let spawned = launch(&self.program, &request.argv(), request.options(), &self.env);
        let (action, _, input, options) = request.into_parts();

        match spawned {
            Ok(child) => {
                let pid = child.id();
                tracing::debug!(program = %self.program, action = %action, ?pid, "Spawned child");

                let token = cancel.clone();
                let task = tokio::spawn(async move {
                    let collected = collect(child, input, &options, token).await;
                    let (error, stdout) = finalize(&action, collected);
                    deliver(callback, error, stdout);
                });
                ProcessHandle::new(pid, cancel, task)
            }
            Err(source) => {
                tracing::warn!(program = %self.program, error = %source, "Failed to launch");
                let error = InvokeError::Launch {
                    program: self.program.clone(),
                    source,
                };
                let task = tokio::spawn(async move {
                    deliver(callback, Some(error), String::new());
                });
                ProcessHandle::new(None, cancel, task)
            }
        }
    }
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new(InvokerConfig::default())
    }
}

/// Decode collected output and turn it into the callback arguments.
fn finalize(
    action: &str,
    collected: std::io::Result<Collected>,
) -> (Option<InvokeError>, String) {
    let collected = match collected {
        Ok(collected) => collected,
        Err(e) => {
            tracing::warn!(action, error = %e, "Failed to collect child output");
            return (Some(InvokeError::Io(e)), String::new());
        }
    };

    let Collected {
        code,
        stdout,
        stderr,
    } = collected;
    let stdout_len = stdout.len();
    let stdout = stdout.into_text();
    let stderr = stderr.into_text();

    let verdict = classify(action, code, &stderr);
    tracing::debug!(
        action,
        ?code,
        stdout_len,
        stderr_len = stderr.len(),
        ?verdict,
        "Child finished"
    );

    match verdict {
        Verdict::Success => (None, stdout),
        Verdict::Failure => (
            Some(InvokeError::Execution {
                message: stderr,
                code,
            }),
            stdout,
        ),
    }
}

fn deliver(callback: Option<Callback>, error: Option<InvokeError>, stdout: String) {
    match callback {
        Some(callback) => callback(error, stdout),
        None => tracing::debug!(failed = error.is_some(), "No callback, dropping result"),
    }
}
