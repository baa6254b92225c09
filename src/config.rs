//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::PathBuf;

/// Page size shared by the followers, following and outbox collections
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub collections: CollectionsConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public domain actors live under (e.g., "tavern.example.com")
    pub domain: String,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Collection rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsConfig {
    /// Items per collection page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Startup provisioning of local actors
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisioningConfig {
    /// Create configured actors and their follow graph on startup
    #[serde(default)]
    pub enabled: bool,
    /// Actor names, as a list or a `;`-separated string
    #[serde(default, deserialize_with = "deserialize_users")]
    pub users: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UsersValue {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_users<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match UsersValue::deserialize(deserializer)? {
        UsersValue::List(names) => names,
        UsersValue::Joined(joined) => joined.split(';').map(str::to_string).collect(),
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (TAVERN__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "data/tavern.db")?
            .set_default("collections.page_size", DEFAULT_PAGE_SIZE as i64)?
            .set_default("provisioning.enabled", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("TAVERN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        let domain = self.server.domain.trim();
        if domain.is_empty() {
            return Err(crate::error::AppError::Config(
                "server.domain must not be empty".to_string(),
            ));
        }
        if domain.contains('/') || domain.contains('@') {
            return Err(crate::error::AppError::Config(format!(
                "server.domain must be a bare host name, got {domain}"
            )));
        }

        if self.collections.page_size == 0 {
            return Err(crate::error::AppError::Config(
                "collections.page_size must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.provisioning.users {
            if name.contains('/') || name.contains('@') {
                return Err(crate::error::AppError::Config(format!(
                    "provisioning.users contains an invalid name: {name}"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(crate::error::AppError::Config(format!(
                    "provisioning.users lists {name} more than once"
                )));
            }
        }

        if self.provisioning.enabled && self.provisioning.users.is_empty() {
            tracing::warn!("Provisioning is enabled but no users are configured");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                domain: "tavern.example.com".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/tavern-test.db"),
            },
            collections: CollectionsConfig::default(),
            provisioning: ProvisioningConfig {
                enabled: true,
                users: vec!["alice".to_string(), "bob".to_string()],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.collections.page_size, 20);
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = valid_config();
        config.collections.page_size = 0;

        let error = config.validate().expect_err("page size 0 must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("collections.page_size")
        ));
    }

    #[test]
    fn validate_rejects_duplicate_users() {
        let mut config = valid_config();
        config.provisioning.users = vec!["alice".to_string(), "alice".to_string()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_domain_with_scheme() {
        let mut config = valid_config();
        config.server.domain = "https://tavern.example.com".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn users_accept_semicolon_separated_string() {
        let parsed: ProvisioningConfig = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "users": "alice; bob;;carol"
        }))
        .unwrap();

        assert_eq!(parsed.users, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn users_accept_list() {
        let parsed: ProvisioningConfig = serde_json::from_value(serde_json::json!({
            "users": ["alice", " bob "]
        }))
        .unwrap();

        assert!(!parsed.enabled);
        assert_eq!(parsed.users, vec!["alice", "bob"]);
    }
}
