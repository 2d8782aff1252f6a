use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub ssl: bool,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "nexusqr".to_string(),
            password: String::new(),
            database: "nexusqr".to_string(),
            ssl: false,
            max_connections: 10,
            min_connections: 0,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

// Hand-written so the password never reaches logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl", &self.ssl)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout", &self.connect_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        // DB_SSL=true only requires TLS; the server certificate is not verified
        let ssl_mode = if self.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(ssl_mode)
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the pool and establishes the first connection.
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await?;

        Ok(Self { pool })
    }

    /// Builds the pool without touching the network; connections are
    /// opened on first use.
    pub fn connect_lazy(config: DatabaseConfig) -> Self {
        let pool = config.pool_options().connect_lazy_with(config.connect_options());
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Applies the migrations embedded from `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let config = DatabaseConfig {
            password: "super-secret-password".to_string(),
            ..Default::default()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-password"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("localhost"));
    }

    #[test]
    fn test_connect_options() {
        let config = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 6543,
            database: "qr".to_string(),
            ..Default::default()
        };

        let options = config.connect_options();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("qr"));
    }

    #[tokio::test]
    async fn test_connect_lazy_does_not_connect() {
        let db = Database::connect_lazy(DatabaseConfig::default());
        assert_eq!(db.pool().size(), 0);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_database_connection() {
        let config = DatabaseConfig {
            username: std::env::var("DB_USERNAME").unwrap_or_else(|_| "nexusqr".to_string()),
            password: std::env::var("DB_PASSWORD").unwrap_or_default(),
            database: std::env::var("DB_DATABASE").unwrap_or_else(|_| "nexusqr".to_string()),
            ..Default::default()
        };
        let db = Database::connect(config).await.expect("Failed to connect to database");
        db.ping().await.expect("Failed to ping database");
        db.migrate().await.expect("Failed to run migrations");
        db.close().await;
    }
}
