use crate::handlers::{docs, fallback, health, users};
use crate::AppState;
use axum::{routing::get, Json, Router};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness))
        .route("/users", get(users::list_users));

    let mut router = Router::new().nest(&state.config.api_prefix, api);

    if !state.config.is_production() {
        let document = docs::document(&state.config);
        router = router.route(
            "/api-docs/openapi.json",
            get(move || {
                let document = document.clone();
                async move { Json(document) }
            }),
        );
    }

    router.fallback(fallback::not_found).with_state(state)
}
