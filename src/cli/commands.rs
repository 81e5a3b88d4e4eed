//! CLI command implementations

use std::path::Path;

use serde_json::json;

use crate::config::ServerConfig;
use crate::http_server::HttpServer;
use crate::identity::codec;
use crate::observability::{log_event_with_fields, Event, Logger};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(&config),
        Command::EncodeId { digits } => {
            println!("{}", json!({"digits": digits, "key": encode_id(&digits)?}));
            Ok(())
        }
        Command::DecodeId { key } => {
            println!("{}", json!({"key": key, "digits": decode_id(&key)?}));
            Ok(())
        }
    }
}

/// Load the config and serve until Ctrl-C
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = ServerConfig::load_or_default(config_path)?;
    Logger::set_min_severity(config.severity()?);

    let path = config_path.display().to_string();
    let addr = config.socket_addr();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", &path), ("addr", &addr)],
    );

    let server = HttpServer::new(config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

pub fn encode_id(digits: &str) -> CliResult<String> {
    Ok(codec::encode(digits)?)
}

pub fn decode_id(key: &str) -> CliResult<String> {
    Ok(codec::decode(key)?)
}
