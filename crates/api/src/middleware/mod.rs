pub mod cors;
pub mod error_handler;
pub mod request_context;
pub mod request_logging;
pub mod security_headers;

pub use cors::CorsPolicy;
pub use error_handler::{normalize_errors, PanicFallback};
pub use request_context::request_context;
pub use request_logging::log_requests;

use axum::http::{header, HeaderName};

/// Request headers marked sensitive so trace output never prints them.
pub const SENSITIVE_HEADERS: [HeaderName; 4] = [
    header::AUTHORIZATION,
    header::COOKIE,
    header::SET_COOKIE,
    HeaderName::from_static("x-api-key"),
];
