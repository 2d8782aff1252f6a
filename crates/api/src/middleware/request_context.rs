use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use nexusqr_context::{
    resolve_request_id, scope_with, ContextHandle, RequestContext, REQUEST_ID_HEADER,
};
use tracing::Instrument;

/// Outermost middleware: resolves the request id, opens the ambient
/// context scope for the rest of the stack, and echoes the id back.
pub async fn request_context(request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    let request_id = resolve_request_id(incoming);

    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        tenant_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    );

    let context = RequestContext::new(request_id.clone()).with_origin(method, path);
    let handle = ContextHandle::with_span(context, span.clone());

    let mut response = scope_with(handle, next.run(request).instrument(span)).await;

    match HeaderValue::from_str(&request_id) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        Err(_) => {
            tracing::warn!(request_id = %request_id, "Request id is not a valid header value")
        }
    }

    response
}
