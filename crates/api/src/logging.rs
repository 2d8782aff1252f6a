use crate::config::{Environment, LoggingConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Keys stripped from any structured payload before it is logged.
pub const REDACTED_KEYS: &[&str] = &[
    "password",
    "currentPassword",
    "newPassword",
    "oldPassword",
    "secret",
    "token",
    "jwt",
    "apiKey",
    "accessToken",
    "refreshToken",
];

/// Installs the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
///
/// JSON lines by default; human-readable output only when `LOG_PRETTY` is
/// set in development.
pub fn init(config: &LoggingConfig, environment: Environment) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.pretty && environment == Environment::Development {
        builder.pretty().try_init()
    } else {
        builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn default_directives(config: &LoggingConfig) -> String {
    let level = config.level.as_directive();
    format!("{level},nexusqr_api={level},tower_http={level},sqlx=warn")
}

fn is_redacted(key: &str) -> bool {
    REDACTED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Removes redacted keys at any depth.
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !is_redacted(key));
            for nested in map.values_mut() {
                redact(nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                redact(item);
            }
        }
        _ => {}
    }
}

pub fn redacted(value: &Value) -> Value {
    let mut copy = value.clone();
    redact(&mut copy);
    copy
}
