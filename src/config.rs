// src/config.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raddb::{MasterKey, RadDB};

/// Prefix of environment overrides, e.g. `PMTRACK__WEB_SERVER__ADDRESS`.
pub const ENV_PREFIX: &str = "PMTRACK";
pub const DEFAULT_CONFIG_PATH: &str = "pmtrack.yaml";

/// `--config` when given, else `./pmtrack.yaml` if present, else the per-user config directory.
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let local = PathBuf::from(DEFAULT_CONFIG_PATH);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("pmtrack").join(DEFAULT_CONFIG_PATH))
        .unwrap_or(local)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("master_key_hex is not set")]
    MissingMasterKey,
    #[error("master_key_hex must be 64 hex characters: {0}")]
    InvalidMasterKey(#[from] hex::FromHexError),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub master_key_hex: Option<String>,

    #[serde(default)]
    pub web_server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_db_path() -> String {
    "pmtrack.db".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_request_size: default_max_request_size(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_request_size() -> usize {
    1024 * 1024 // 1 MB
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Refuse to switch into an organization the user is not a member of.
    #[serde(default = "default_true")]
    pub require_membership_on_switch: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            identity: IdentityConfig::default(),
            require_membership_on_switch: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,
    pub secret_key: Option<String>,
    pub private_key_path: Option<String>,
    pub public_key_path: Option<String>,
    #[serde(default = "default_token_expiry", with = "humantime_serde")]
    pub token_expiry: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: default_jwt_algorithm(),
            secret_key: None,
            private_key_path: None,
            public_key_path: None,
            token_expiry: default_token_expiry(),
        }
    }
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_expiry() -> Duration {
    Duration::from_secs(24 * 3600)
}

/// Trusted upstream that completes the identity provider sign-in.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IdentityConfig {
    /// Shared secret expected in `x-identity-secret`. Unset disables the callback.
    pub callback_secret: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub enable_json_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            enable_json_output: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            master_key_hex: None,
            web_server: ServerConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// YAML file (optional) overlaid with `PMTRACK__SECTION__KEY` variables.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Defaults plus a freshly generated master key and JWT secret.
    pub fn generate() -> Self {
        let mut config = Self::default();
        config.master_key_hex = Some(hex::encode(RadDB::generate_key()));
        config.security.jwt.secret_key = Some(hex::encode(RadDB::generate_key()));
        config
    }

    pub fn master_key(&self) -> Result<MasterKey, ConfigError> {
        let hex_key = self.master_key_hex.as_deref().ok_or(ConfigError::MissingMasterKey)?;
        let mut key = [0u8; 32];
        hex::decode_to_slice(hex_key, &mut key)?;
        Ok(key)
    }
}
