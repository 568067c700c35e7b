//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Shortest accepted token lifetime
const MIN_TOKEN_TTL_MINUTES: i64 = 1;
/// Longest accepted token lifetime (30 days)
const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// User created on first start when the users table is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<SeedUserConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on handling a single request, storage I/O included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret; tokens can be neither issued nor validated without it
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

impl AuthConfig {
    /// The configured secret, with an empty string counted as unset
    pub fn secret(&self) -> Option<&str> {
        self.secret_key.as_deref().filter(|s| !s.is_empty())
    }

    /// Get the token lifetime clamped to the accepted range
    pub fn validated_token_ttl_minutes(&self) -> i64 {
        if self.token_ttl_minutes < MIN_TOKEN_TTL_MINUTES {
            warn!(
                "token_ttl_minutes {} is below minimum {}, using minimum",
                self.token_ttl_minutes, MIN_TOKEN_TTL_MINUTES
            );
            MIN_TOKEN_TTL_MINUTES
        } else if self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            warn!(
                "token_ttl_minutes {} exceeds maximum {}, using maximum",
                self.token_ttl_minutes, MAX_TOKEN_TTL_MINUTES
            );
            MAX_TOKEN_TTL_MINUTES
        } else {
            self.token_ttl_minutes
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            token_ttl_minutes: default_token_ttl_minutes(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_secs: default_cors_max_age_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Seed user configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUserConfig {
    pub username: String,
    pub password: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_db_path() -> String {
    "./data/quiz.db".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    quiz_auth::DEFAULT_TOKEN_TTL_MINUTES
}

fn default_cors_max_age_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    ///
    /// Returns `None` when the file does not exist. Logging is not set up
    /// yet at this point, so the caller reports which source was used.
    pub fn load(path: &str) -> Result<Option<Self>> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(Some(config))
    }

    /// Apply command-line and environment overrides
    pub fn apply_overrides(
        &mut self,
        bind: Option<String>,
        port: Option<u16>,
        secret_key: Option<String>,
        database: Option<String>,
    ) {
        if let Some(bind) = bind {
            self.server.bind_address = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(secret_key) = secret_key {
            self.auth.secret_key = Some(secret_key);
        }
        if let Some(database) = database {
            self.database.path = database;
        }
    }
}
