// NexusQR API server
// HTTP plumbing: request context, error normalization, logging and docs

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod validation;

use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use crate::config::Config;
use crate::error::{ErrorPipeline, ErrorPolicy};
use crate::middleware::{CorsPolicy, PanicFallback};
use nexusqr_database::Database;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, TraceLayer},
};
use tracing::Level;

pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub errors: Arc<ErrorPipeline>,
}

impl AppState {
    pub fn new(config: Config, database: Database) -> Self {
        let policy = ErrorPolicy::for_environment(config.environment);
        let errors = Arc::new(ErrorPipeline::new(policy));
        Self {
            config,
            database,
            errors,
        }
    }
}

/// Full application: routes plus the middleware stack.
pub fn build_app(state: Arc<AppState>) -> Router {
    let router = routes::create_router(state.clone());
    with_middleware(router, &state)
}

/// Wraps `router` in the standard stack, outermost first:
/// request context, completion log, sensitive headers, trace, CORS,
/// compression, security headers, panic fallback, error normalization.
pub fn with_middleware(router: Router, state: &AppState) -> Router {
    let router = router
        .layer(from_fn_with_state(state.errors.clone(), middleware::normalize_errors))
        .layer(CatchPanicLayer::custom(PanicFallback::new(state.errors.policy())));

    middleware::security_headers::apply(router)
        .layer(CompressionLayer::new())
        .layer(CorsPolicy::from_setting(&state.config.cors_origin).into_layer())
        .layer(
            // Failures are logged once by the error pipeline or panic fallback
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
        .layer(SetSensitiveRequestHeadersLayer::new(middleware::SENSITIVE_HEADERS))
        .layer(from_fn(middleware::log_requests))
        .layer(from_fn(middleware::request_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
        routing::{get, post},
        Json,
    };
    use crate::error::{ApiError, ApiResult, AppError, DatabaseFailure};
    use nexusqr_context::REQUEST_ID_HEADER;
    use nexusqr_database::DatabaseConfig;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;
    use tracing_subscriber::layer::SubscriberExt;
    use crate::validation::{validate_slug, ValidatedJson};
    use validator::Validate;

    fn config(environment: &str) -> Config {
        let vars: HashMap<String, String> = [
            ("ENVIRONMENT", environment),
            ("DB_HOST", "127.0.0.1"),
            ("DB_PORT", "1"),
            ("DB_USERNAME", "nexusqr"),
            ("DB_PASSWORD", "nexusqr"),
            ("DB_DATABASE", "nexusqr"),
            ("CORS_ORIGIN", "https://app.example.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Config::from_vars(vars).unwrap()
    }

    fn state(environment: &str) -> Arc<AppState> {
        let config = config(environment);
        let database = Database::connect_lazy(DatabaseConfig {
            connect_timeout: Duration::from_millis(500),
            ..config.database.clone()
        });
        Arc::new(AppState::new(config, database))
    }

    #[derive(Debug, Deserialize, Validate)]
    struct NewProfile {
        #[validate(custom(function = "validate_slug"))]
        slug: String,
        #[validate(length(min = 2, max = 50))]
        title: String,
    }

    async fn create_profile(ValidatedJson(profile): ValidatedJson<NewProfile>) -> Json<Value> {
        Json(json!({ "slug": profile.slug }))
    }

    async fn duplicate() -> ApiResult<Json<Value>> {
        Err(DatabaseFailure::new("23505", "duplicate key value violates unique constraint").into())
    }

    async fn missing() -> ApiResult<Json<Value>> {
        Err(AppError::not_found("QR code", Some("42")).into())
    }

    async fn tenant_scoped() -> ApiResult<String> {
        nexusqr_context::set_tenant("tenant_a1B2c3D4e5F6g7H8")?;
        let child = nexusqr_context::spawn(async { nexusqr_context::require_tenant() });
        let tenant = child.await.map_err(anyhow::Error::from)??;
        Ok(tenant)
    }

    async fn needs_user() -> ApiResult<String> {
        Ok(nexusqr_context::require_user()?)
    }

    async fn broken() -> ApiResult<String> {
        Err(anyhow::anyhow!("disk on fire").into())
    }

    async fn explode() -> &'static str {
        panic!("kaboom")
    }

    fn app(environment: &str) -> Router {
        let state = state(environment);
        let router = routes::create_router(state.clone()).merge(
            Router::new()
                .route("/test/profiles", post(create_profile))
                .route("/test/duplicate", get(duplicate))
                .route("/test/missing", get(missing))
                .route("/test/tenant", get(tenant_scoped))
                .route("/test/user", get(needs_user))
                .route("/test/broken", get(broken))
                .route("/test/panic", get(explode)),
        );
        with_middleware(router, &state)
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("test").oneshot(request("GET", "/api/v1/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unmatched_route() {
        let response = app("development")
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nowhere?x=1")
                    .header(REQUEST_ID_HEADER, "trace-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-123");

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Cannot GET /api/v1/nowhere?x=1");
        assert_eq!(body["errors"], Value::Null);
        assert_eq!(body["path"], "/api/v1/nowhere?x=1");
        assert_eq!(body["method"], "GET");
        assert_eq!(body["requestId"], "trace-123");
        assert_eq!(body["debug"]["exceptionName"], "HttpError");
    }

    #[tokio::test]
    async fn test_generated_request_id_matches_body() {
        let response = app("test").oneshot(request("GET", "/test/missing")).await.unwrap();

        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        let body = json_body(response).await;

        assert_eq!(body["requestId"], header.as_str());
        assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
        assert_eq!(body["message"], "QR code with ID 42 not found");
    }

    #[tokio::test]
    async fn test_unique_violation_is_conflict() {
        let response = app("test").oneshot(request("GET", "/test/duplicate")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = json_body(response).await;
        assert_eq!(body["code"], "UNIQUE_CONSTRAINT_VIOLATION");
        assert_eq!(body["errors"]["code"], "23505");
    }

    #[tokio::test]
    async fn test_validation_failure() {
        let response = app("test")
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/test/profiles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"slug":"Bad Slug","title":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["message"],
            "slug must be a lowercase slug, title must be between 2 and 50 characters"
        );
        assert_eq!(body["errors"][0], "slug must be a lowercase slug");
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let response = app("test")
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/test/profiles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"slug":"acme","title":"Acme"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["slug"], "acme");
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_reshaped() {
        let response = app("test").oneshot(request("DELETE", "/api/v1/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));

        let body = json_body(response).await;
        assert_eq!(body["code"], "HTTP_ERROR");
        assert_eq!(body["message"], "Method Not Allowed");
        assert_eq!(body["method"], "DELETE");
    }

    #[tokio::test]
    async fn test_context_survives_spawn() {
        let response = app("test").oneshot(request("GET", "/test/tenant")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"tenant_a1B2c3D4e5F6g7H8");
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let response = app("test").oneshot(request("GET", "/test/user")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "UserId is required but not set in request context");
    }

    #[tokio::test]
    async fn test_panic_fallback() {
        let response = app("development")
            .oneshot(
                Request::builder()
                    .uri("/test/panic")
                    .header(REQUEST_ID_HEADER, "panic-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "panic-1");

        let body = json_body(response).await;
        assert_eq!(body["requestId"], "panic-1");
        assert_eq!(body["errorCode"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["message"], "kaboom");
        assert_eq!(body["path"], "/test/panic");
    }

    #[tokio::test]
    async fn test_panic_message_hidden_in_production() {
        let response = app("production").oneshot(request("GET", "/test/panic")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_production_omits_debug() {
        let response = app("production").oneshot(request("GET", "/nowhere")).await.unwrap();
        let body = json_body(response).await;

        assert_eq!(body["statusCode"], 404);
        assert!(body.get("debug").is_none());
    }

    #[tokio::test]
    async fn test_openapi_only_outside_production() {
        let docs = "/api-docs/openapi.json";
        let response = app("development").oneshot(request("GET", docs)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["info"]["title"], "NexusQR API");

        let response = app("production").oneshot(request("GET", docs)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let response = app("test").oneshot(request("GET", "/api/v1/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(response).await;
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_user_list_rejects_oversized_page() {
        let response = app("test")
            .oneshot(request("GET", "/api/v1/users?limit=500"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["path"], "/api/v1/users?limit=500");
    }

    #[tokio::test]
    async fn test_user_list_without_database() {
        let response = app("production").oneshot(request("GET", "/api/v1/users")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = app("test")
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/v1/health")
                    .header(header::ORIGIN, "https://tenant.walialink.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://tenant.walialink.com"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[tokio::test]
    async fn test_unknown_failure_debug_outside_production() {
        let response = app("development").oneshot(request("GET", "/test/broken")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "disk on fire");
        assert_eq!(body["debug"]["exceptionName"], "Error");
        assert!(body["debug"]["stack"].as_str().unwrap().contains("disk on fire"));
    }

    /// Records the level and target of every event.
    #[derive(Clone, Default)]
    struct CapturedEvents(Arc<Mutex<Vec<(Level, String)>>>);

    impl CapturedEvents {
        fn warnings_and_errors(&self) -> Vec<(Level, String)> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(level, _)| *level == Level::WARN || *level == Level::ERROR)
                .cloned()
                .collect()
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturedEvents {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let metadata = event.metadata();
            self.0
                .lock()
                .unwrap()
                .push((*metadata.level(), metadata.target().to_string()));
        }
    }

    async fn failure_events(environment: &str, uri: &str) -> Vec<(Level, String)> {
        let events = CapturedEvents::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(events.clone()),
        );

        let response = app(environment).oneshot(request("GET", uri)).await.unwrap();
        let _ = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        events.warnings_and_errors()
    }

    #[tokio::test]
    async fn test_one_log_line_per_failure() {
        let events = failure_events("test", "/test/duplicate").await;
        assert_eq!(events, vec![(Level::WARN, "nexusqr_api::error::pipeline".to_string())]);

        let events = failure_events("test", "/test/broken").await;
        assert_eq!(events, vec![(Level::ERROR, "nexusqr_api::error::pipeline".to_string())]);

        let events = failure_events("test", "/test/panic").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, Level::ERROR);

        let events = failure_events("test", "/test/missing").await;
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_api_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
