//! Invoker error types.

/// Errors raised synchronously, before any process is created.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// A positional argument has the wrong shape.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Errors delivered through the completion callback.
#[derive(thiserror::Error, Debug)]
pub enum InvokeError {
    /// The tool ran but the result was classified as a failure.
    ///
    /// `code` is the exit code, which may be `Some(0)` when the failure was
    /// caused by unexpected diagnostic output, and `None` when the process
    /// was terminated by a signal.
    #[error("{message}")]
    Execution { message: String, code: Option<i32> },

    /// The executable could not be started.
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// Reading from or waiting on the child failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokeError {
    /// Exit code of the child, if the failure carries one.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Execution { code, .. } => *code,
            Self::Launch { .. } | Self::Io(_) => None,
        }
    }

    /// Whether the executable was missing or not runnable.
    #[must_use]
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }
}
