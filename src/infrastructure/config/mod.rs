//! Configuration management

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::messaging::dispatcher::DEFAULT_ACK_MESSAGE;

/// Relay configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub token: Option<String>,
    /// Reply sent to a user the first time they are registered
    pub ack_message: String,
    /// Long-poll timeout for getUpdates, in seconds
    pub poll_timeout: i64,
    /// Telegram parse mode for outgoing messages (e.g. "HTML"); plain text if unset
    pub parse_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub users_file: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            ack_message: DEFAULT_ACK_MESSAGE.to_string(),
            poll_timeout: 60,
            parse_mode: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from("users.json"),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Load from `path` if it exists, otherwise start from defaults; then apply env overrides
    pub fn resolve(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = if path.exists() {
            Config::load(&path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            })
        } else {
            Config::default()
        };

        config.with_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from environment-style lookups
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = var("BOT_TOKEN").filter(|t| !t.is_empty()) {
            self.bot.token = Some(token);
        }

        if let Some(bind) = var("RELAY_HTTP_BIND") {
            self.http.bind = bind;
        }

        if let Some(users_file) = var("RELAY_USERS_FILE") {
            self.storage.users_file = PathBuf::from(users_file);
        }

        self
    }

    pub fn token(&self) -> Result<&str, ConfigError> {
        self.bot
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("bot.token".to_string()))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http
            .bind
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("http.bind '{}': {}", self.http.bind, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bot.ack_message, DEFAULT_ACK_MESSAGE);
        assert_eq!(config.bot.poll_timeout, 60);
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.storage.users_file, PathBuf::from("users.json"));
        assert!(config.token().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("bot:\n  token: \"123:abc\"\n  poll-timeout: 30\n").unwrap();
        assert_eq!(config.token().unwrap(), "123:abc");
        assert_eq!(config.bot.poll_timeout, 30);
        assert_eq!(config.bot.ack_message, DEFAULT_ACK_MESSAGE);
        assert_eq!(config.http.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_default_yaml_parses_back() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("users-file"));
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.http.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BOT_TOKEN", "999:xyz"),
            ("RELAY_HTTP_BIND", "127.0.0.1:9000"),
            ("RELAY_USERS_FILE", "/tmp/relay-users.json"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().with_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.token().unwrap(), "999:xyz");
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
        assert_eq!(config.storage.users_file, PathBuf::from("/tmp/relay-users.json"));
    }

    #[test]
    fn test_invalid_bind() {
        let mut config = Config::default();
        config.http.bind = "not an address".to_string();
        assert!(matches!(config.bind_addr(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::from_yaml("bot: ["), Err(ConfigError::Parse(_))));
    }
}
