//! restkind CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. All configuration
//! loading and server startup happens inside the CLI module.

use restkind::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
