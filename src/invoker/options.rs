//! Spawn configuration passed through to the child process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::process::Command;

use super::ArgumentError;

/// Per-call spawn configuration.
///
/// Built from a string-keyed mapping. `cwd`, `env`, `clear_env` and
/// `timeout` apply everywhere; `killSignal`, `uid`, `gid` and `argv0` apply
/// on unix. Any other key is kept in `extra` and ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnOptions {
    /// Working directory of the child.
    pub cwd: Option<PathBuf>,
    /// Environment entries added to the child's environment.
    pub env: HashMap<String, String>,
    /// Start from an empty environment instead of inheriting ours.
    pub clear_env: bool,
    /// Signal the child once it has run this long.
    pub timeout: Option<Duration>,
    /// Signal sent when `timeout` expires. Defaults to `SIGTERM`.
    #[cfg(unix)]
    pub kill_signal: Option<nix::sys::signal::Signal>,
    /// User ID the child runs as.
    #[cfg(unix)]
    pub uid: Option<u32>,
    /// Group ID the child runs as.
    #[cfg(unix)]
    pub gid: Option<u32>,
    /// `argv[0]` reported to the child instead of the program path.
    #[cfg(unix)]
    pub argv0: Option<String>,
    /// Keys this crate does not interpret.
    pub extra: Map<String, Value>,
}

fn invalid(key: &str, expected: &str) -> ArgumentError {
    ArgumentError::InvalidArgument(format!("spawn option `{key}` must be {expected}"))
}

fn parse_string(key: &str, value: &Value) -> Result<Option<String>, ArgumentError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(invalid(key, "a string")),
    }
}

#[cfg(unix)]
fn parse_id(key: &str, value: &Value) -> Result<Option<u32>, ArgumentError> {
    match value {
        Value::Null => Ok(None),
        _ => value
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .map(Some)
            .ok_or_else(|| invalid(key, "a numeric id")),
    }
}

/// Environment values are stringified the way a shell would see them.
fn parse_env(value: &Value) -> Result<HashMap<String, String>, ArgumentError> {
    let map = match value {
        Value::Null => return Ok(HashMap::new()),
        Value::Object(map) => map,
        _ => return Err(invalid("env", "an object")),
    };

    let mut env = HashMap::with_capacity(map.len());
    for (name, value) in map {
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Bool(_) | Value::Number(_) => value.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(invalid(&format!("env.{name}"), "a string or scalar"))
            }
        };
        env.insert(name.clone(), value);
    }
    Ok(env)
}

/// Milliseconds; zero disables the timeout.
fn parse_timeout(value: &Value) -> Result<Option<Duration>, ArgumentError> {
    match value {
        Value::Null => Ok(None),
        _ => match value.as_u64() {
            Some(0) => Ok(None),
            Some(ms) => Ok(Some(Duration::from_millis(ms))),
            None => Err(invalid("timeout", "a non-negative number of milliseconds")),
        },
    }
}

#[cfg(unix)]
fn parse_signal(value: &Value) -> Result<Option<nix::sys::signal::Signal>, ArgumentError> {
    use nix::sys::signal::Signal;
    use std::str::FromStr;

    let signal = match value {
        Value::Null => return Ok(None),
        Value::String(name) => Signal::from_str(name).ok(),
        _ => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .and_then(|n| Signal::try_from(n).ok()),
    };
    signal
        .map(Some)
        .ok_or_else(|| invalid("killSignal", "a signal name or number"))
}

impl SpawnOptions {
    /// Empty options: inherit everything from the current process.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add one environment entry.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Do not inherit the parent environment.
    #[must_use]
    pub fn clear_env(mut self, clear: bool) -> Self {
        self.clear_env = clear;
        self
    }

    /// Signal the child after `limit`.
    #[must_use]
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Signal sent when the timeout expires.
    #[cfg(unix)]
    #[must_use]
    pub fn kill_signal(mut self, signal: nix::sys::signal::Signal) -> Self {
        self.kill_signal = Some(signal);
        self
    }

    /// Build options from a mapping.
    ///
    /// Only the keys this crate applies are checked; everything else is kept
    /// as-is in `extra`.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::InvalidArgument` naming the key whose value
    /// cannot be applied, e.g. a numeric `cwd`.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ArgumentError> {
        let mut options = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "cwd" => options.cwd = parse_string(key, value)?.map(PathBuf::from),
                "env" => options.env = parse_env(value)?,
                "clear_env" => {
                    options.clear_env = match value {
                        Value::Null => false,
                        Value::Bool(clear) => *clear,
                        _ => return Err(invalid(key, "a boolean")),
                    };
                }
                "timeout" => options.timeout = parse_timeout(value)?,
                #[cfg(unix)]
                "killSignal" => options.kill_signal = parse_signal(value)?,
                #[cfg(unix)]
                "uid" => options.uid = parse_id(key, value)?,
                #[cfg(unix)]
                "gid" => options.gid = parse_id(key, value)?,
                #[cfg(unix)]
                "argv0" => options.argv0 = parse_string(key, value)?,
                _ => {
                    options.extra.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(options)
    }

    /// Apply these options to a command, layered over `base_env`.
    ///
    /// `timeout` and `kill_signal` are enforced while the child runs, not
    /// here.
    pub(crate) fn apply(&self, cmd: &mut Command, base_env: &HashMap<String, String>) {
        if self.clear_env {
            cmd.env_clear();
        }
        cmd.envs(base_env);
        cmd.envs(&self.env);

        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        {
            if let Some(uid) = self.uid {
                cmd.uid(uid);
            }
            if let Some(gid) = self.gid {
                cmd.gid(gid);
            }
            if let Some(ref argv0) = self.argv0 {
                cmd.arg0(argv0);
            }
        }

        if !self.extra.is_empty() {
            let keys: Vec<&str> = self.extra.keys().map(String::as_str).collect();
            tracing::warn!(?keys, "Ignoring unsupported spawn options");
        }
    }
}
