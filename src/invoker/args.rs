//! Argument validation and normalization.

use serde_json::Value;

use super::{ArgumentError, SpawnOptions};

/// A positional argument whose shape is only known at runtime.
///
/// Used by [`resolve_args`] to reproduce the two call shapes
/// `(command, options)` and `(command, input, options)` from a single list.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A text value.
    Text(String),
    /// A raw byte buffer.
    Buffer(Vec<u8>),
    /// Any JSON value; objects are accepted as spawn options.
    Json(Value),
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// A validated invocation: command, arguments, input and spawn options.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    command: String,
    args: Vec<String>,
    input: Option<Vec<u8>>,
    options: SpawnOptions,
}

impl InvocationRequest {
    /// Tokenize `command_line` and build a request.
    ///
    /// The command line is split on whitespace; quoting is not supported, so
    /// a single argument cannot contain spaces.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::InvalidArgument` if the command line is blank.
    pub fn new(
        command_line: &str,
        input: Option<Vec<u8>>,
        options: SpawnOptions,
    ) -> Result<Self, ArgumentError> {
        let mut tokens = command_line.split_whitespace().map(str::to_string);
        let command = tokens.next().ok_or_else(|| {
            ArgumentError::InvalidArgument(
                "command string must contain an OpenSSL command".to_string(),
            )
        })?;

        Ok(Self {
            command,
            args: tokens.collect(),
            input,
            options,
        })
    }

    /// First token of the command line; also the classification key.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.command
    }

    /// Tokens after the first one.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Full argument vector handed to the executable, first token included.
    #[must_use]
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Data written to the child's stdin, if any.
    #[must_use]
    pub fn input(&self) -> Option<&[u8]> {
        self.input.as_deref()
    }

    /// Spawn options for this call.
    #[must_use]
    pub fn options(&self) -> &SpawnOptions {
        &self.options
    }

    pub(crate) fn into_parts(self) -> (String, Vec<String>, Option<Vec<u8>>, SpawnOptions) {
        (self.command, self.args, self.input, self.options)
    }
}

/// Resolve positional arguments into a request.
///
/// The first argument must be text. If the second is a byte buffer it is the
/// input and the third holds the options; otherwise the second holds the
/// options and there is no input. The options slot must be a mapping.
///
/// # Errors
///
/// Returns `ArgumentError::InvalidArgument` naming the offending slot, or
/// the offending key when the options slot is a mapping with a bad value.
pub fn resolve_args(args: Vec<Arg>) -> Result<InvocationRequest, ArgumentError> {
    let mut args = args.into_iter();

    let command_line = match args.next() {
        Some(Arg::Text(s) | Arg::Json(Value::String(s))) => s,
        _ => {
            return Err(ArgumentError::InvalidArgument(
                "first argument must be a command string: OpenSSL command and arguments expected"
                    .to_string(),
            ))
        }
    };

    let (input, options_arg) = match args.next() {
        Some(Arg::Buffer(bytes)) => (Some(bytes), args.next()),
        other => (None, other),
    };

    let options = match options_arg {
        Some(Arg::Json(Value::Object(ref map))) => SpawnOptions::from_map(map)?,
        _ => {
            let slot = if input.is_some() { "third" } else { "second" };
            return Err(ArgumentError::InvalidArgument(format!(
                "{slot} argument must be an object of options: options are passed to the process spawn"
            )));
        }
    };

    InvocationRequest::new(&command_line, input, options)
}
