//! Tests for the positional-argument entry point.

use serde_json::json;
use spawn_openssl::config::InvokerConfig;
use spawn_openssl::{Arg, ArgumentError, Invoker};

use super::{channel_callback, fake_openssl};

fn marker_invoker(marker: &std::path::Path) -> Invoker {
    let mut config = InvokerConfig {
        program: fake_openssl().to_string_lossy().into_owned(),
        ..InvokerConfig::default()
    };
    config
        .env
        .insert("FAKE_MARKER".to_string(), marker.to_string_lossy().into_owned());
    Invoker::new(config)
}

#[tokio::test]
async fn non_string_command_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let invoker = marker_invoker(&marker);

    let err = invoker
        .invoke_args(vec![Arg::Json(json!(42)), Arg::Json(json!({}))], None)
        .unwrap_err();

    assert!(matches!(err, ArgumentError::InvalidArgument(_)));
    assert!(err.to_string().starts_with("first argument must be a command string"));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn valid_call_does_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let invoker = marker_invoker(&marker);
    let (callback, rx) = channel_callback();

    invoker
        .invoke_args(vec!["version".into(), json!({}).into()], Some(callback))
        .unwrap();
    let (error, _) = rx.await.unwrap();

    assert!(error.is_none());
    assert!(marker.exists());
}

#[tokio::test]
async fn bad_options_after_buffer_mention_third_argument() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let invoker = marker_invoker(&marker);

    let err = invoker
        .invoke_args(
            vec![
                "rsa -check".into(),
                b"key".to_vec().into(),
                json!("not options").into(),
            ],
            None,
        )
        .unwrap_err();

    assert!(err.to_string().contains("third argument"));
    assert!(!marker.exists());
}

#[tokio::test]
async fn bad_options_without_buffer_mention_second_argument() {
    let err = Invoker::default()
        .invoke_args(vec!["rsa -check".into(), json!(true).into()], None)
        .unwrap_err();

    assert!(err.to_string().contains("second argument"));
}

#[tokio::test]
async fn blank_command_is_rejected() {
    let err = Invoker::default()
        .invoke("  ", spawn_openssl::SpawnOptions::new(), None)
        .unwrap_err();

    assert!(matches!(err, ArgumentError::InvalidArgument(_)));
}

#[tokio::test]
async fn buffer_argument_becomes_stdin() {
    let (callback, rx) = channel_callback();
    Invoker::with_program(fake_openssl().to_string_lossy())
        .invoke_args(
            vec![
                "req.verify -noout".into(),
                b"csr bytes".to_vec().into(),
                json!({ "env": { "FAKE_ECHO_STDIN": "1" } }).into(),
            ],
            Some(callback),
        )
        .unwrap();

    let (error, stdout) = rx.await.unwrap();
    assert!(error.is_none());
    assert_eq!(stdout, "csr bytes");
}

#[tokio::test]
async fn scalar_env_values_are_passed_as_strings() {
    let (callback, rx) = channel_callback();
    Invoker::with_program(fake_openssl().to_string_lossy())
        .invoke_args(
            vec![
                "version".into(),
                json!({ "env": { "FAKE_STDOUT": 1, "FAKE_EXIT": 0 } }).into(),
            ],
            Some(callback),
        )
        .unwrap();

    let (error, stdout) = rx.await.unwrap();
    assert!(error.is_none());
    assert_eq!(stdout, "1");
}

#[tokio::test]
async fn bad_option_value_names_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let invoker = marker_invoker(&marker);

    let err = invoker
        .invoke_args(vec!["version".into(), json!({ "cwd": 5 }).into()], None)
        .unwrap_err();

    assert!(matches!(err, ArgumentError::InvalidArgument(_)));
    assert!(err.to_string().contains("`cwd`"));
    assert!(!err.to_string().contains("second argument"));
    assert!(!marker.exists());
}
