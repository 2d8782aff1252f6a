use axum::http::{header, request::Parts, HeaderName, HeaderValue, Method};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Allowlist used when `CORS_ORIGIN` is empty.
pub const FALLBACK_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:9093",
    "https://dev.walialink.com",
    "https://dev.admin.walialink.com",
    "https://dev.api.walialink.com",
];

lazy_static! {
    static ref TRUSTED_DOMAIN: Regex =
        Regex::new(r"^https://([a-z0-9-]+\.)*walialink\.com$").unwrap();
}

/// Origin policy built from the comma-separated `CORS_ORIGIN` setting.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_any: bool,
    origins: HashSet<String>,
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

impl CorsPolicy {
    /// `*` allows every origin; an empty value falls back to the built-in list.
    pub fn from_setting(setting: &str) -> Self {
        let entries: Vec<&str> = setting
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();

        let entries = if entries.is_empty() {
            FALLBACK_ORIGINS.to_vec()
        } else {
            entries
        };

        Self {
            allow_any: entries.contains(&"*"),
            origins: entries.into_iter().map(normalize).collect(),
        }
    }

    /// Subdomains of walialink.com over https are always trusted.
    pub fn allows(&self, origin: &str) -> bool {
        if self.allow_any {
            return true;
        }
        let origin = normalize(origin);
        self.origins.contains(&origin) || TRUSTED_DOMAIN.is_match(&origin)
    }

    pub fn into_layer(self) -> CorsLayer {
        // Credentials rule out a literal `*`, so origins are always mirrored
        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin.to_str().map(|o| self.allows(o)).unwrap_or(false)
        });

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-requested-with"),
                HeaderName::from_static("x-admin-secret"),
                HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([
                HeaderName::from_static("content-range"),
                HeaderName::from_static("x-content-range"),
                HeaderName::from_static("x-request-id"),
            ])
            .max_age(Duration::from_secs(86400))
    }
}
