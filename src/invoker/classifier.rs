//! Success/failure classification of a finished invocation.
//!
//! Some OpenSSL commands report progress or verification results on stderr
//! even when they succeed. For those commands the diagnostic text must start
//! with a known phrase; anything else on stderr is treated as a failure even
//! with a zero exit code.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Expected stderr prefixes, keyed by action.
const RULES: &[(&str, &str)] = &[
    ("cms.verify", "verification successful"),
    ("genrsa", "generating"),
    ("pkcs12", "mac verified ok"),
    ("req.new", "generating"),
    ("req.verify", "verify ok"),
    ("rsa", "writing rsa key"),
    ("smime.verify", "verification successful"),
    ("x509.req", "signature ok"),
];

static RULE_TABLE: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|(action, phrase)| {
            match Regex::new(&format!("(?i)^{}", regex::escape(phrase))) {
                Ok(pattern) => Some((*action, pattern)),
                Err(e) => {
                    tracing::warn!(action, error = %e, "Failed to compile classification rule");
                    None
                }
            }
        })
        .collect()
});

/// Outcome of classifying a finished invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    /// Whether the verdict is a success.
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Expected stderr pattern for an action key, if the action has a rule.
///
/// Keys are matched exactly and case-sensitively.
#[must_use]
pub fn expected_stderr(action: &str) -> Option<&'static Regex> {
    RULE_TABLE.get(action)
}

/// All rules as `(action, phrase)` pairs, sorted by action.
#[must_use]
pub fn rules() -> &'static [(&'static str, &'static str)] {
    RULES
}

/// Classify a finished invocation.
///
/// Fails when the exit code is non-zero or absent, or when the action has a
/// rule and non-empty stderr does not start with the expected phrase.
#[must_use]
pub fn classify(action: &str, code: Option<i32>, stderr: &str) -> Verdict {
    if code != Some(0) {
        return Verdict::Failure;
    }
    if stderr.is_empty() {
        return Verdict::Success;
    }
    match expected_stderr(action) {
        Some(pattern) if !pattern.is_match(stderr) => Verdict::Failure,
        _ => Verdict::Success,
    }
}
