use axum::{extract::Request, http::header, middleware::Next, response::Response};
use std::time::Instant;

/// Emits one `request.completed` line per request, after the handler and
/// error normalization have run, so tenant/user set during handling are
/// included.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let context = nexusqr_context::current();

    tracing::info!(
        request_id = context.as_ref().map(|c| c.request_id()),
        tenant_id = context.as_ref().and_then(|c| c.tenant_id()),
        user_id = context.as_ref().and_then(|c| c.user_id()),
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms,
        user_agent = user_agent.as_deref(),
        "request.completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body, http::Request as HttpRequest, http::StatusCode, middleware, routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_passes_response_through() {
        let app = Router::new()
            .route("/created", get(|| async { (StatusCode::CREATED, "ok") }))
            .layer(middleware::from_fn(log_requests));

        let response = app
            .oneshot(HttpRequest::builder().uri("/created").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
