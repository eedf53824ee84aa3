//! Storage configuration types.

use serde::Deserialize;

/// Storage type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Postgres,
    Sqlite,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// PostgreSQL-specific configuration.
    pub postgres: PostgresConfig,
    /// SQLite-specific configuration.
    pub sqlite: SqliteConfig,
}

/// PostgreSQL-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5433,
            user: "myuser".to_string(),
            password: "mypassword".to_string(),
            database: "myapp".to_string(),
            max_connections: 10,
        }
    }
}

#[cfg(feature = "postgres")]
impl PostgresConfig {
    /// Connection options for sqlx, TLS disabled.
    ///
    /// Credentials are passed as discrete fields, never spliced into a URL,
    /// so any character is allowed in the user name or password.
    pub fn connect_options(&self) -> sqlx::postgres::PgConnectOptions {
        sqlx::postgres::PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(sqlx::postgres::PgSslMode::Disable)
    }
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file, created if missing.
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "./data/orders.db".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let storage = StorageConfig::default();
        assert_eq!(storage.storage_type, StorageType::Postgres);
        assert_eq!(storage.postgres.host, "localhost");
        assert_eq!(storage.postgres.port, 5433);
        assert_eq!(storage.sqlite.path, "./data/orders.db");
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_connect_options_defaults() {
        let options = PostgresConfig::default().connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "myuser");
        assert_eq!(options.get_database(), Some("myapp"));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_connect_options_with_special_characters_in_credentials() {
        let pg = PostgresConfig {
            user: "ops@team".to_string(),
            password: "p@ss/w#rd?x=1".to_string(),
            ..PostgresConfig::default()
        };

        let options = pg.connect_options();

        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "ops@team");
        assert_eq!(options.get_database(), Some("myapp"));
    }
}
