use crate::error::{
    ApiError, ErrorPipeline, ErrorPolicy, FallbackBody, HttpError, RequestMeta, UnhandledError,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::ResponseForPanic;

// Framework bodies being re-shaped are short plain-text messages
const MAX_RESHAPED_BODY: usize = 64 * 1024;

/// Turns every failed response into the uniform error body.
///
/// Handlers return [`ApiError`]s; their responses carry the original error
/// in an [`UnhandledError`] extension which is run through the pipeline
/// here. Non-JSON 4xx/5xx responses produced by the framework itself
/// (405s, extractor rejections) are re-shaped as text `HttpError`s.
pub async fn normalize_errors(
    State(pipeline): State<Arc<ErrorPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let meta = RequestMeta::new(request.method(), request.uri());
    let mut response = next.run(request).await;

    if let Some(UnhandledError(error)) = response.extensions_mut().remove::<UnhandledError>() {
        return pipeline.respond(&error, &meta);
    }

    if !needs_reshaping(response.status(), response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let text = match axum::body::to_bytes(body, MAX_RESHAPED_BODY).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let message = if text.is_empty() {
        parts
            .status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        text
    };

    let error = ApiError::Http(HttpError::text(parts.status, message));
    let mut reshaped = pipeline.respond(&error, &meta);

    // Keep framework headers such as `Allow` on 405s
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            reshaped.headers_mut().append(name.clone(), value.clone());
        }
    }

    reshaped
}

fn needs_reshaping(status: StatusCode, headers: &HeaderMap) -> bool {
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.starts_with("application/json") || ct.contains("+json"))
        .unwrap_or(false);

    !is_json
}

/// Last-resort response for panics anywhere below the panic layer.
#[derive(Debug, Clone, Copy)]
pub struct PanicFallback {
    production: bool,
}

impl PanicFallback {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            production: policy.production,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&'static str>().copied())
}

impl ResponseForPanic for PanicFallback {
    type ResponseBody = Body;

    fn response_for_panic(
        &mut self,
        payload: Box<dyn Any + Send + 'static>,
    ) -> Response<Self::ResponseBody> {
        let detail = panic_message(payload.as_ref()).unwrap_or("panic with non-string payload");
        tracing::error!(panic = %detail, "Unhandled panic while processing request");

        let message = if self.production {
            "Internal server error"
        } else {
            detail
        };

        let body = FallbackBody::from_context("INTERNAL_SERVER_ERROR", message);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
