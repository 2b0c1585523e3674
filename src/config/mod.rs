//! Configuration loading for the Notion Bridge API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `BRIDGE_`, producing a typed [`AppConfig`]. The loaded value is immutable;
//! everything that needs configuration receives it explicitly.

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration derived from `BRIDGE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_key: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    #[serde(default = "default_webhook_topic")]
    pub webhook_topic: String,
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
    #[serde(default = "default_oauth_state_ttl_secs")]
    pub oauth_state_ttl_secs: i64,
    #[serde(default)]
    pub notion: NotionConfig,
}

/// Notion OAuth and API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NotionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_notion_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_notion_api_version")]
    pub api_version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            api_base_url: default_notion_api_base_url(),
            api_version: default_notion_api_version(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            crypto_key: None,
            jwt_secret: None,
            webhook_secret: None,
            webhook_topic: default_webhook_topic(),
            event_bus_capacity: default_event_bus_capacity(),
            oauth_state_ttl_secs: default_oauth_state_ttl_secs(),
            notion: NotionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.crypto_key.is_some() {
            config.crypto_key = Some(b"[REDACTED]".to_vec());
        }
        if config.jwt_secret.is_some() {
            config.jwt_secret = Some("[REDACTED]".to_string());
        }
        if config.webhook_secret.is_some() {
            config.webhook_secret = Some("[REDACTED]".to_string());
        }
        if config.notion.client_id.is_some() {
            config.notion.client_id = Some("[REDACTED]".to_string());
        }
        if config.notion.client_secret.is_some() {
            config.notion.client_secret = Some("[REDACTED]".to_string());
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error if required settings
    /// are missing or out of bounds.
    ///
    /// The webhook secret is deliberately not checked here: an absent secret
    /// keeps the service bootable and surfaces as a 500 on the webhook
    /// endpoint instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.crypto_key {
            Some(ref key) if key.len() != 32 => {
                return Err(ConfigError::InvalidCryptoKeyLength { length: key.len() });
            }
            Some(_) => {}
            None => return Err(ConfigError::MissingCryptoKey),
        }

        match self.jwt_secret {
            Some(ref secret) if !secret.is_empty() => {}
            _ => return Err(ConfigError::MissingJwtSecret),
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.event_bus_capacity == 0 {
            return Err(ConfigError::InvalidBusCapacity);
        }

        if self.oauth_state_ttl_secs <= 0 {
            return Err(ConfigError::InvalidOauthStateTtl {
                value: self.oauth_state_ttl_secs,
            });
        }

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_database_url() -> String {
    "sqlite://notion_bridge.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_webhook_topic() -> String {
    "notion.webhook.received".to_string()
}

fn default_event_bus_capacity() -> usize {
    1024
}

fn default_oauth_state_ttl_secs() -> i64 {
    600 // 10 minutes
}

fn default_notion_api_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_api_version() -> String {
    "2022-06-28".to_string()
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("crypto key is missing; set BRIDGE_CRYPTO_KEY environment variable")]
    MissingCryptoKey,
    #[error("crypto key is invalid base64: {error}")]
    InvalidCryptoKeyBase64 { error: String },
    #[error("crypto key must decode to exactly 32 bytes, got {length} bytes")]
    InvalidCryptoKeyLength { length: usize },
    #[error("JWT secret is missing; set BRIDGE_JWT_SECRET environment variable")]
    MissingJwtSecret,
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("event bus capacity must be positive")]
    InvalidBusCapacity,
    #[error("oauth state TTL must be positive, got {value}")]
    InvalidOauthStateTtl { value: i64 },
}

/// Loads configuration using layered `.env` files and `BRIDGE_*` env vars.
///
/// File order: `.env`, `.env.local`, `.env.{profile}`, `.env.{profile}.local`;
/// later layers win, and the real process environment wins over all files.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads, resolves, and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("BRIDGE_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let crypto_key = match layered.remove("CRYPTO_KEY") {
            Some(key_str) if !key_str.is_empty() => {
                use base64::{Engine as _, engine::general_purpose};
                let decoded = general_purpose::STANDARD.decode(&key_str).map_err(|e| {
                    ConfigError::InvalidCryptoKeyBase64 {
                        error: e.to_string(),
                    }
                })?;
                Some(decoded)
            }
            _ => None,
        };

        let jwt_secret = layered.remove("JWT_SECRET").filter(|v| !v.is_empty());
        let webhook_secret = layered.remove("WEBHOOK_SECRET");
        let webhook_topic = layered
            .remove("WEBHOOK_TOPIC")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_webhook_topic);
        let event_bus_capacity = layered
            .remove("EVENT_BUS_CAPACITY")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_event_bus_capacity);
        let oauth_state_ttl_secs = layered
            .remove("OAUTH_STATE_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_oauth_state_ttl_secs);

        let notion = NotionConfig {
            client_id: layered.remove("NOTION_CLIENT_ID").filter(|v| !v.is_empty()),
            client_secret: layered
                .remove("NOTION_CLIENT_SECRET")
                .filter(|v| !v.is_empty()),
            redirect_uri: layered
                .remove("NOTION_REDIRECT_URI")
                .filter(|v| !v.is_empty()),
            api_base_url: layered
                .remove("NOTION_API_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_notion_api_base_url),
            api_version: layered
                .remove("NOTION_API_VERSION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_notion_api_version),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            crypto_key,
            jwt_secret,
            webhook_secret,
            webhook_topic,
            event_bus_capacity,
            oauth_state_ttl_secs,
            notion,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        // An explicit BRIDGE_PROFILE env var selects the profile before the
        // profile-specific files are layered.
        let profile = env::var("BRIDGE_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix("BRIDGE_") {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            crypto_key: Some(vec![0u8; 32]),
            jwt_secret: Some("test-jwt-secret".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.profile, "local");
        assert_eq!(config.api_bind_addr, "0.0.0.0:8080");
        assert_eq!(config.webhook_topic, "notion.webhook.received");
        assert_eq!(config.event_bus_capacity, 1024);
        assert_eq!(config.notion.api_base_url, "https://api.notion.com");
        config.bind_addr().expect("default bind addr parses");
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_crypto_key() {
        let config = AppConfig {
            crypto_key: None,
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCryptoKey)
        ));
    }

    #[test]
    fn validate_rejects_short_crypto_key() {
        let config = AppConfig {
            crypto_key: Some(vec![0u8; 16]),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCryptoKeyLength { length: 16 })
        ));
    }

    #[test]
    fn validate_rejects_missing_jwt_secret() {
        let config = AppConfig {
            jwt_secret: None,
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingJwtSecret)
        ));
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let config = AppConfig {
            log_format: "xml".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogFormat { .. })
        ));
    }

    #[test]
    fn validate_allows_absent_webhook_secret() {
        // Booting without a webhook secret is allowed; the webhook endpoint
        // reports the misconfiguration per request instead.
        let config = AppConfig {
            webhook_secret: None,
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn redacted_json_hides_secrets() {
        let config = AppConfig {
            webhook_secret: Some("hook-secret".to_string()),
            notion: NotionConfig {
                client_id: Some("client-id".to_string()),
                client_secret: Some("client-secret".to_string()),
                ..NotionConfig::default()
            },
            ..valid_config()
        };

        let json = config.redacted_json().expect("serializes");
        assert!(!json.contains("hook-secret"));
        assert!(!json.contains("client-secret"));
        assert!(!json.contains("test-jwt-secret"));
        assert!(json.contains("[REDACTED]"));
    }
}
