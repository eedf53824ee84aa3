//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod server;
mod storage;

pub use server::{PipelineConfig, ServerConfig};
pub use storage::{PostgresConfig, SqliteConfig, StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ORDER_SERVICE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ORDER_SERVICE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ORDER_SERVICE_LOG";

/// Flat environment variables accepted for deployments that predate the
/// structured layout, mapped to their config keys.
pub const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("DB_HOST", "storage.postgres.host"),
    ("DB_PORT", "storage.postgres.port"),
    ("DB_USER", "storage.postgres.user"),
    ("DB_PASSWORD", "storage.postgres.password"),
    ("DB_NAME", "storage.postgres.database"),
    ("NATS_URL", "messaging.nats.url"),
    ("NATS_CLIENT_ID", "messaging.nats.client_id"),
    ("NATS_CHANNEL", "messaging.nats.subject"),
    ("NATS_DURABLE_ID", "messaging.nats.durable_name"),
    ("HTTP_PORT", "server.http_port"),
];

use serde::Deserialize;

use crate::bus::MessagingConfig;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Messaging configuration.
    pub messaging: MessagingConfig,
    /// Ingestion pipeline configuration.
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, e.g.
    ///    `ORDER_SERVICE__STORAGE__TYPE=sqlite`
    /// 5. Legacy flat variables listed in `LEGACY_ENV_VARS`
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV_VARS {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;
    use crate::bus::MessagingType;

    fn clear_env() {
        for (var, _) in LEGACY_ENV_VARS {
            std::env::remove_var(var);
        }
        std::env::remove_var(CONFIG_ENV_VAR);
        std::env::remove_var("ORDER_SERVICE__STORAGE__TYPE");
        std::env::remove_var("ORDER_SERVICE__SERVER__HTTP_PORT");
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.storage.storage_type, StorageType::Postgres);
        assert_eq!(config.messaging.messaging_type, MessagingType::Nats);
        assert_eq!(config.pipeline.persist_timeout_ms, 10_000);
    }

    #[test]
    #[serial]
    fn test_load_without_sources_uses_defaults() {
        clear_env();

        let config = Config::load(None).unwrap();

        assert_eq!(config.storage.postgres.port, 5433);
        assert_eq!(config.messaging.nats.durable_name, "order-service-durable");
    }

    #[test]
    #[serial]
    fn test_load_prefixed_env() {
        clear_env();
        std::env::set_var("ORDER_SERVICE__STORAGE__TYPE", "sqlite");
        std::env::set_var("ORDER_SERVICE__SERVER__HTTP_PORT", "9090");

        let config = Config::load(None).unwrap();
        clear_env();

        assert_eq!(config.storage.storage_type, StorageType::Sqlite);
        assert_eq!(config.server.http_port, 9090);
    }

    #[test]
    #[serial]
    fn test_load_legacy_env() {
        clear_env();
        std::env::set_var("DB_HOST", "db.internal");
        std::env::set_var("DB_PORT", "6543");
        std::env::set_var("NATS_CHANNEL", "orders-v2");
        std::env::set_var("HTTP_PORT", "8181");

        let config = Config::load(None).unwrap();
        clear_env();

        assert_eq!(config.storage.postgres.host, "db.internal");
        assert_eq!(config.storage.postgres.port, 6543);
        assert_eq!(config.messaging.nats.subject, "orders-v2");
        assert_eq!(config.server.http_port, 8181);
    }

    #[test]
    #[serial]
    fn test_load_yaml_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "storage:\n  type: sqlite\n  sqlite:\n    path: /tmp/orders-test.db\n\
             messaging:\n  type: channel\n  channel:\n    max_deliver: 3\n\
             pipeline:\n  persist_timeout_ms: 250"
        )
        .unwrap();

        let config = Config::load(file.path().to_str()).unwrap();

        assert_eq!(config.storage.storage_type, StorageType::Sqlite);
        assert_eq!(config.storage.sqlite.path, "/tmp/orders-test.db");
        assert_eq!(config.messaging.messaging_type, MessagingType::Channel);
        assert_eq!(config.messaging.channel.max_deliver, 3);
        assert_eq!(config.pipeline.persist_timeout_ms, 250);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_is_error() {
        clear_env();
        assert!(Config::load(Some("/nonexistent/order-service.yaml")).is_err());
    }
}
