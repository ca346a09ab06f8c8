//! Colored CLI output.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::invoker::InvokeError;

/// Print the classification rule table.
pub fn print_rules(rules: &[(&str, &str)]) {
    let width = rules.iter().map(|(action, _)| action.len()).max().unwrap_or(0);
    for (action, phrase) in rules {
        println!("{:<width$}  {}", action.cyan().bold(), phrase.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Write the tool's output verbatim.
pub fn print_output(stdout: &str) {
    let mut out = io::stdout().lock();
    let _ = out.write_all(stdout.as_bytes());
    let _ = out.flush();
}

/// Print a failed invocation to stderr.
pub fn print_failure(error: &InvokeError) {
    let label = match error {
        InvokeError::Execution { .. } => "[FAILED]",
        InvokeError::Launch { .. } => "[LAUNCH]",
        InvokeError::Io(_) => "[IO]",
    };
    let code = error
        .code()
        .map_or_else(|| "none".to_string(), |c| c.to_string());
    eprintln!("{} exit code {}", label.red().bold(), code.yellow());

    let message = error.to_string();
    if !message.is_empty() {
        eprint!("{message}");
        if !message.ends_with('\n') {
            eprintln!();
        }
    }
}

/// Exit code to use for a failed invocation.
///
/// The child's own code when non-zero, otherwise 1.
#[must_use]
pub fn failure_exit_code(error: &InvokeError) -> i32 {
    match error.code() {
        Some(code) if code != 0 => code,
        _ => 1,
    }
}
