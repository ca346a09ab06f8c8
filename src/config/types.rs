//! Configuration types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for the invoker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Executable to launch.
    #[serde(default = "default_program")]
    pub program: String,
    /// Environment entries applied to every child, before per-call entries.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_program() -> String {
    "openssl".to_string()
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            env: HashMap::new(),
        }
    }
}
