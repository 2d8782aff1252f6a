use crate::config::Config;
use crate::error::{DebugInfo, ErrorBody};
use crate::handlers::health::{self, HealthResponse};
use crate::handlers::users;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NexusQR API",
        description = "Multi-tenant QR Code & Digital Profile Management API",
        version = "1.0.0"
    ),
    paths(health::health_check, health::readiness, users::list_users),
    components(schemas(HealthResponse, ErrorBody, DebugInfo)),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "users", description = "User accounts")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "access-token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Enter JWT token"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document with the server URL taken from configuration.
pub fn document(config: &Config) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(format!(
        "{}{}",
        config.app_url.trim_end_matches('/'),
        config.api_prefix
    ))]);
    doc
}
