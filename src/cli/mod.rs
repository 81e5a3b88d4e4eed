//! CLI module for restkind
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP server
//! - encode-id / decode-id: Inspect user keys

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{decode_id, encode_id, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
