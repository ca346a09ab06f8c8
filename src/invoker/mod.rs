//! Process invocation of the OpenSSL command-line tool.

mod accumulator;
mod args;
mod classifier;
mod error;
mod handle;
mod launcher;
mod options;
mod runner;

pub use accumulator::*;
pub use args::*;
pub use classifier::*;
pub use error::*;
pub use handle::*;
pub use options::*;
pub use runner::*;
