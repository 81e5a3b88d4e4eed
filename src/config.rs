//! Server configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid config.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{HeaderIdentity, IdentityResolver, JwtIdentity, JwtSettings};
use crate::observability::Severity;
use crate::rest::server::DEFAULT_BODY_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How callers are identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AuthConfig {
    /// Trust `x-restkind-user-id` / `x-restkind-user-email` from a fronting proxy
    Header,
    /// HS256 bearer tokens
    Jwt(JwtSettings),
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::Header
    }
}

impl AuthConfig {
    pub fn resolver(&self) -> Arc<dyn IdentityResolver> {
        match self {
            AuthConfig::Header => Arc::new(HeaderIdentity::new()),
            AuthConfig::Jwt(settings) => Arc::new(JwtIdentity::new(settings.clone())),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Send errors with their HTTP status instead of 200
    #[serde(default)]
    pub http_error_status: bool,

    /// Largest accepted request body in bytes (default: 32 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    DEFAULT_BODY_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            http_error_status: false,
            max_body_bytes: default_max_body_bytes(),
            log_level: default_log_level(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_json_str(&content)
    }

    /// Load from `path`, or defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: ServerConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be > 0".to_string()));
        }

        self.severity()?;

        if let AuthConfig::Jwt(settings) = &self.auth {
            for (name, value) in [
                ("secret", &settings.secret),
                ("issuer", &settings.issuer),
                ("audience", &settings.audience),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "auth.{} must not be empty",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| ConfigError::Invalid(e))
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
