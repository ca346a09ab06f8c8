//! Invoker tests.
//!
//! A shell script stands in for `openssl`; its behaviour is controlled by
//! `FAKE_*` environment variables passed through the spawn options. The
//! fake is a shell script, so these tests are unix-only.

mod args_test;
mod result_test;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use spawn_openssl::{Callback, InvokeError, Invoker, SpawnOptions};
use tempfile::TempDir;
use tokio::sync::oneshot;

const FAKE_OPENSSL: &str = r#"#!/bin/sh
[ -n "$FAKE_IGNORE_TERM" ] && trap '' TERM
[ -n "$FAKE_MARKER" ] && touch "$FAKE_MARKER"
if [ -n "$FAKE_ECHO_STDIN" ]; then
    cat
elif [ -z "$FAKE_SKIP_STDIN" ]; then
    cat > /dev/null
fi
[ -n "$FAKE_ARGS" ] && printf '%s\n' "$@"
[ -n "$FAKE_PWD" ] && pwd
printf '%s' "$FAKE_STDOUT"
printf '%s' "$FAKE_STDERR" >&2
if [ -n "$FAKE_GRANDCHILD" ]; then
    sleep "$FAKE_GRANDCHILD" &
fi
[ -n "$FAKE_SLEEP" ] && exec sleep "$FAKE_SLEEP"
exit "${FAKE_EXIT:-0}"
"#;

/// Path to the fake `openssl` executable, written once per test binary.
pub fn fake_openssl() -> &'static Path {
    static SCRIPT: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = SCRIPT.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openssl");
        std::fs::write(&path, FAKE_OPENSSL).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

/// Invoker that launches the fake `openssl`.
pub fn fake_invoker() -> Invoker {
    Invoker::with_program(fake_openssl().to_string_lossy())
}

/// Spawn options describing what the fake tool should do.
pub fn behaviour(exit: i32, stdout: &str, stderr: &str) -> SpawnOptions {
    SpawnOptions::new()
        .env("FAKE_EXIT", exit.to_string())
        .env("FAKE_STDOUT", stdout)
        .env("FAKE_STDERR", stderr)
}

/// Callback that forwards the result into a oneshot channel.
pub fn channel_callback() -> (Callback, oneshot::Receiver<(Option<InvokeError>, String)>) {
    let (tx, rx) = oneshot::channel();
    let callback: Callback = Box::new(move |error, stdout| {
        let _ = tx.send((error, stdout));
    });
    (callback, rx)
}

/// Run a command to completion and return the callback arguments.
pub async fn run(
    invoker: &Invoker,
    command: &str,
    input: Option<&[u8]>,
    options: SpawnOptions,
) -> (Option<InvokeError>, String) {
    let (callback, rx) = channel_callback();
    let _handle = match input {
        Some(input) => invoker.invoke_with_input(command, input, options, Some(callback)),
        None => invoker.invoke(command, options, Some(callback)),
    }
    .unwrap();
    rx.await.unwrap()
}
