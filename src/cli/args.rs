//! CLI argument definitions using clap
//!
//! Commands:
//! - restkind serve --config <path>
//! - restkind encode-id <digits>
//! - restkind decode-id <key>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// restkind - a schema-less REST front end over a document store
#[derive(Parser, Debug)]
#[command(name = "restkind")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file; defaults apply when it does not exist
        #[arg(long, default_value = "./restkind.json")]
        config: PathBuf,
    },

    /// Print the alphabetic key for a numeric user id
    EncodeId {
        /// Decimal digits
        digits: String,
    },

    /// Print a digit string that encodes to the given key
    DecodeId {
        /// Letters from the key alphabet
        key: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
