// Request ID resolution
// Reuses a caller-supplied correlation id or generates a fresh one

use uuid::Uuid;

/// Header used to read and echo the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Resolves the request id from the inbound header value.
///
/// A value that is non-empty after trimming is reused (trimmed) so traces can
/// be correlated across services; anything else gets a new random id.
pub fn resolve_request_id(incoming: Option<&str>) -> String {
    match incoming.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_request_id(),
    }
}

pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
