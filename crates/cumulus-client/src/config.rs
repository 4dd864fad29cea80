//! Client configuration.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $CUMULUS_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/cumulus/config.toml
//!   3. ~/.config/cumulus/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::oauth::Credentials;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Cloud endpoint base address.
    pub address: String,
    /// API version the client adheres to.
    pub api_version: String,
    /// Client version reported to the cloud. Arbitrary.
    pub client_version: String,
    /// Client platform tag.
    pub client_type: String,
    /// Name of the user logging in. Arbitrary.
    pub session_user: String,
    /// Unique value tied to the physical system; must match what was
    /// used at login when authenticating with a saved token.
    pub host_uuid: String,
    /// Name of the machine we are running on.
    pub host_name: String,
    /// Saved auth token. Set to bypass login.
    pub auth_token: String,
    pub oauth: OAuthConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl OAuthConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            access_token: self.access_token.clone(),
            access_token_secret: self.access_token_secret.clone(),
        }
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "https://api.cumulus.cloud".into(),
            api_version: "1.0".into(),
            client_version: env!("CARGO_PKG_VERSION").into(),
            client_type: std::env::consts::OS.into(),
            session_user: String::new(),
            host_uuid: String::new(),
            host_name: std::env::var("HOSTNAME").unwrap_or_default(),
            auth_token: String::new(),
            oauth: OAuthConfig::default(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("cumulus")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            let mut config = ClientConfig::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Load config from an explicit file, then apply env overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        let mut config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("CUMULUS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&ClientConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply CUMULUS_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CUMULUS_ADDRESS") {
            self.address = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_AUTH_TOKEN") {
            self.auth_token = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_SESSION_USER") {
            self.session_user = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_HOST_UUID") {
            self.host_uuid = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_OAUTH__CONSUMER_KEY") {
            self.oauth.consumer_key = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_OAUTH__CONSUMER_SECRET") {
            self.oauth.consumer_secret = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_OAUTH__ACCESS_TOKEN") {
            self.oauth.access_token = v;
        }
        if let Ok(v) = std::env::var("CUMULUS_OAUTH__ACCESS_TOKEN_SECRET") {
            self.oauth.access_token_secret = v;
        }
    }
}
