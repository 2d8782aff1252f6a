use crate::error::{ApiError, HttpError};
use axum::extract::OriginalUri;
use axum::http::Method;

/// Fallback for unmatched routes. `OriginalUri` keeps the nest prefix.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    HttpError::not_found(format!("Cannot {} {}", method, target)).into()
}
