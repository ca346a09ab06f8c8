//! Spawn OpenSSL - run the OpenSSL command-line tool and classify its result.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spawn_openssl::config::ConfigLoader;
use spawn_openssl::display;
use spawn_openssl::invoker::{rules, Arg, Callback, InvokeError, Invoker};

#[derive(Parser)]
#[command(
    name = "spawn-openssl",
    about = "Run OpenSSL and classify the result",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (overrides the default search paths).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one OpenSSL command.
    Run {
        /// Command and arguments, e.g. "rsa -in key.pem -check".
        command: String,
        /// File whose contents are written to OpenSSL's stdin.
        #[arg(long, conflicts_with = "stdin")]
        input: Option<PathBuf>,
        /// Forward our stdin to OpenSSL.
        #[arg(long)]
        stdin: bool,
        /// Spawn options as a JSON object, e.g. '{"cwd": "/tmp"}'.
        #[arg(long, default_value = "{}")]
        options: String,
        /// Kill OpenSSL if it has not finished after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// List commands whose stderr is checked on success.
    Rules,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_input(path: Option<PathBuf>, stdin: bool) -> std::io::Result<Option<Vec<u8>>> {
    if let Some(path) = path {
        return std::fs::read(path).map(Some);
    }
    if stdin {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(Some(buf));
    }
    Ok(None)
}

async fn run(
    invoker: &Invoker,
    command: String,
    input: Option<Vec<u8>>,
    options: serde_json::Value,
    timeout: Option<Duration>,
) -> ExitCode {
    let mut args = vec![Arg::Text(command)];
    if let Some(input) = input {
        args.push(Arg::Buffer(input));
    }
    args.push(Arg::Json(options));

    let (tx, mut rx) = oneshot::channel::<(Option<InvokeError>, String)>();
    let callback: Callback = Box::new(move |error, stdout| {
        let _ = tx.send((error, stdout));
    });

    let handle = match invoker.invoke_args(args, Some(callback)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    tracing::info!(pid = ?handle.id(), "Invocation started");

    let completed = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut rx).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?limit, "Timed out, killing OpenSSL");
                handle.kill();
                rx.await
            }
        },
        None => rx.await,
    };

    match completed {
        Ok((None, stdout)) => {
            display::print_output(&stdout);
            ExitCode::SUCCESS
        }
        Ok((Some(error), stdout)) => {
            display::print_output(&stdout);
            display::print_failure(&error);
            ExitCode::from(u8::try_from(display::failure_exit_code(&error)).unwrap_or(1))
        }
        Err(_) => {
            eprintln!("Error: invocation ended without a result");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Run {
            command,
            input,
            stdin,
            options,
            timeout,
        } => {
            let options: serde_json::Value = match serde_json::from_str(&options) {
                Ok(value) => value,
                Err(e) => {
                    eprintln!("Error: --options is not valid JSON: {e}");
                    return ExitCode::from(2);
                }
            };
            let input = match read_input(input, stdin) {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("Error: failed to read input: {e}");
                    return ExitCode::from(2);
                }
            };

            let invoker = Invoker::new(config);
            run(
                &invoker,
                command,
                input,
                options,
                timeout.map(Duration::from_secs),
            )
            .await
        }
        Commands::Rules => {
            display::print_rules(rules());
            ExitCode::SUCCESS
        }
    }
}
