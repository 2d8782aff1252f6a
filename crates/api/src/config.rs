use nexusqr_database::DatabaseConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Environment variables read at startup. Anything else in the process
/// environment is ignored.
pub const ENV_KEYS: &[&str] = &[
    "ENVIRONMENT",
    "APP_NAME",
    "APP_HOST",
    "APP_PORT",
    "APP_URL",
    "API_PREFIX",
    "CORS_ORIGIN",
    "LOG_LEVEL",
    "LOG_PRETTY",
    "DB_HOST",
    "DB_PORT",
    "DB_USERNAME",
    "DB_PASSWORD",
    "DB_DATABASE",
    "DB_SSL",
    "DB_MAX_CONNECTIONS",
    "DB_RUN_MIGRATIONS",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Deployment mode; production withholds diagnostics from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `tracing` has no fatal level; it collapses into error.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Fatal | Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub pretty: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub app_name: String,
    pub server_host: String,
    pub server_port: u16,
    pub app_url: String,
    pub api_prefix: String,
    pub cors_origin: String,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars = std::env::vars()
            .filter(|(key, _)| ENV_KEYS.contains(&key.as_str()))
            .collect();
        Self::from_vars(vars)
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw: RawConfig = ::config::Config::builder()
            .add_source(
                ::config::Environment::default()
                    .source(Some(vars))
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        raw.validate()?;
        Ok(raw.into())
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

fn default_app_name() -> String {
    "NexusQR SaaS".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    3000
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_max_connections() -> u32 {
    10
}

fn validate_api_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.len() > 1 && prefix.starts_with('/') && !prefix.ends_with('/') {
        Ok(())
    } else {
        Err(ValidationError::new("api_prefix"))
    }
}

// One field per environment variable, lowercased by the config crate
#[derive(Debug, Deserialize, Validate)]
struct RawConfig {
    #[serde(default)]
    environment: Environment,
    #[serde(default = "default_app_name")]
    app_name: String,
    #[serde(default = "default_app_host")]
    app_host: String,
    #[serde(default = "default_app_port")]
    app_port: u16,
    #[serde(default = "default_app_url")]
    #[validate(url)]
    app_url: String,
    #[serde(default = "default_api_prefix")]
    #[validate(custom(function = "validate_api_prefix"))]
    api_prefix: String,
    #[serde(default = "default_cors_origin")]
    cors_origin: String,
    #[serde(default)]
    log_level: LogLevel,
    #[serde(default)]
    log_pretty: bool,
    #[serde(default = "default_db_host")]
    db_host: String,
    #[serde(default = "default_db_port")]
    db_port: u16,
    #[validate(length(min = 1))]
    db_username: String,
    #[validate(length(min = 1))]
    db_password: String,
    #[validate(length(min = 1))]
    db_database: String,
    #[serde(default)]
    db_ssl: bool,
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1, max = 100))]
    db_max_connections: u32,
    #[serde(default)]
    db_run_migrations: bool,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            environment: raw.environment,
            app_name: raw.app_name,
            server_host: raw.app_host,
            server_port: raw.app_port,
            app_url: raw.app_url,
            api_prefix: raw.api_prefix,
            cors_origin: raw.cors_origin,
            logging: LoggingConfig {
                level: raw.log_level,
                pretty: raw.log_pretty,
            },
            database: DatabaseConfig {
                host: raw.db_host,
                port: raw.db_port,
                username: raw.db_username,
                password: raw.db_password,
                database: raw.db_database,
                ssl: raw.db_ssl,
                max_connections: raw.db_max_connections,
                min_connections: 0,
                connect_timeout: Duration::from_secs(10),
                idle_timeout: Duration::from_secs(600),
            },
            run_migrations: raw.db_run_migrations,
        }
    }
}
