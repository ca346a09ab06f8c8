//! Spawn OpenSSL - run the OpenSSL command-line tool and classify its result.
//!
//! The [`Invoker`](invoker::Invoker) launches the tool, feeds it optional
//! input, collects stdout and stderr, and reports success or failure through a
//! completion callback. Success depends on the exit code and, for a handful of
//! commands that chat on stderr, on the diagnostic text starting with an
//! expected phrase.

pub mod config;
pub mod display;
pub mod invoker;

pub use invoker::{
    Arg, ArgumentError, Callback, InvocationRequest, InvokeError, Invoker, ProcessHandle,
    SpawnOptions,
};
