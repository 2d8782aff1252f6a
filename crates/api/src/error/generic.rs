use super::http::{join_messages, HttpError, HttpPayload};
use super::pipeline::{Classification, NormalizedError};
use super::ApiError;
use axum::http::StatusCode;
use nexusqr_context::ContextError;
use serde_json::Value;

/// Taxonomy code for a bare HTTP status.
pub fn code_for_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "VALIDATION_ERROR",
        401 => "UNAUTHORIZED",
        403 => "FORBIDDEN",
        404 => "NOT_FOUND",
        409 => "CONFLICT",
        422 => "UNPROCESSABLE_ENTITY",
        429 => "RATE_LIMIT_EXCEEDED",
        500 => "INTERNAL_ERROR",
        503 => "SERVICE_UNAVAILABLE",
        _ => "HTTP_ERROR",
    }
}

/// Catch-all classifier. Never declines.
pub fn classify(error: &ApiError, production: bool) -> Classification {
    let normalized = match error {
        ApiError::App(app) => NormalizedError {
            status: app.status(),
            code: app.code().to_string(),
            message: app.to_string(),
            details: app.details().cloned(),
        },
        ApiError::Http(http) => from_http(http),
        ApiError::Context(ContextError::MissingRequiredField(_)) => NormalizedError {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED".to_string(),
            message: error.to_string(),
            details: None,
        },
        _ => {
            let message = if production {
                "Internal server error".to_string()
            } else {
                let own = error.to_string();
                if own.trim().is_empty() {
                    "An unexpected error occurred".to_string()
                } else {
                    own
                }
            };
            NormalizedError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_ERROR".to_string(),
                message,
                details: None,
            }
        }
    };

    Classification::Normalized(normalized)
}

fn from_http(error: &HttpError) -> NormalizedError {
    let status = error.status();

    match error.payload() {
        HttpPayload::Text(text) => NormalizedError {
            status,
            code: code_for_status(status).to_string(),
            message: text.clone(),
            details: None,
        },
        HttpPayload::Object(map) => {
            let code = match map.get("code") {
                Some(Value::String(code)) => code.clone(),
                _ => code_for_status(status).to_string(),
            };

            let raw_message = map.get("message");
            let message = match raw_message {
                Some(Value::String(message)) if !message.is_empty() => message.clone(),
                Some(Value::Array(items)) => join_messages(items),
                _ => "Request failed".to_string(),
            };

            let details = match (map.get("errors"), raw_message) {
                (Some(errors), _) => Some(errors.clone()),
                (None, Some(list @ (Value::Array(_) | Value::Object(_)))) => Some(list.clone()),
                _ => None,
            };

            NormalizedError {
                status,
                code,
                message,
                details,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;

    fn normalized(error: ApiError, production: bool) -> NormalizedError {
        match classify(&error, production) {
            Classification::Normalized(n) => n,
            Classification::Declined => panic!("application classifier must not decline"),
        }
    }

    #[test]
    fn test_domain_error_passes_through() {
        let error = AppError::not_found("QR code", Some("42"));
        let n = normalized(ApiError::App(error), true);

        assert_eq!(n.status, StatusCode::NOT_FOUND);
        assert_eq!(n.code, "RESOURCE_NOT_FOUND");
        assert_eq!(n.message, "QR code with ID 42 not found");
        assert!(n.details.is_none());
    }

    #[test]
    fn test_list_message_is_joined() {
        let error = HttpError::json(
            StatusCode::BAD_REQUEST,
            json!({ "message": ["email must be an email", "password too short"] }),
        );
        let n = normalized(ApiError::Http(error), false);

        assert_eq!(n.status, StatusCode::BAD_REQUEST);
        assert_eq!(n.code, "VALIDATION_ERROR");
        assert_eq!(n.message, "email must be an email, password too short");
        assert_eq!(n.details, Some(json!(["email must be an email", "password too short"])));
    }

    #[test]
    fn test_payload_code_and_errors_win() {
        let error = HttpError::json(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "code": "SLOW_DOWN", "message": "Too many", "errors": { "retryAfter": 30 } }),
        );
        let n = normalized(ApiError::Http(error), false);

        assert_eq!(n.code, "SLOW_DOWN");
        assert_eq!(n.message, "Too many");
        assert_eq!(n.details, Some(json!({ "retryAfter": 30 })));
    }

    #[test]
    fn test_object_message_becomes_generic() {
        let error = HttpError::json(
            StatusCode::FORBIDDEN,
            json!({ "message": { "reason": "nope" } }),
        );
        let n = normalized(ApiError::Http(error), false);

        assert_eq!(n.code, "FORBIDDEN");
        assert_eq!(n.message, "Request failed");
        assert_eq!(n.details, Some(json!({ "reason": "nope" })));
    }

    #[test]
    fn test_empty_message_becomes_generic() {
        let error = HttpError::json(StatusCode::CONFLICT, json!({ "message": "" }));
        let n = normalized(ApiError::Http(error), false);

        assert_eq!(n.code, "CONFLICT");
        assert_eq!(n.message, "Request failed");
        assert!(n.details.is_none());
    }

    #[test]
    fn test_text_payload_uses_status_table() {
        let error = HttpError::text(StatusCode::IM_A_TEAPOT, "short and stout");
        let n = normalized(ApiError::Http(error), false);
        assert_eq!(n.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(n.code, "HTTP_ERROR");
        assert_eq!(n.message, "short and stout");
    }

    #[test]
    fn test_missing_required_field_is_unauthorized() {
        let n = normalized(ApiError::Context(ContextError::MissingRequiredField("TenantId")), true);
        assert_eq!(n.status, StatusCode::UNAUTHORIZED);
        assert_eq!(n.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_unknown_error_in_production() {
        let n = normalized(ApiError::Internal(anyhow::anyhow!("disk on fire")), true);
        assert_eq!(n.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(n.code, "INTERNAL_ERROR");
        assert_eq!(n.message, "Internal server error");
    }

    #[test]
    fn test_unknown_error_outside_production() {
        let n = normalized(ApiError::Internal(anyhow::anyhow!("disk on fire")), false);
        assert_eq!(n.message, "disk on fire");

        let n = normalized(ApiError::Internal(anyhow::anyhow!("")), false);
        assert_eq!(n.message, "An unexpected error occurred");

        let n = normalized(ApiError::Context(ContextError::Missing), false);
        assert_eq!(n.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(n.code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_status_table() {
        assert_eq!(code_for_status(StatusCode::UNAUTHORIZED), "UNAUTHORIZED");
        assert_eq!(code_for_status(StatusCode::UNPROCESSABLE_ENTITY), "UNPROCESSABLE_ENTITY");
        assert_eq!(code_for_status(StatusCode::SERVICE_UNAVAILABLE), "SERVICE_UNAVAILABLE");
        assert_eq!(code_for_status(StatusCode::METHOD_NOT_ALLOWED), "HTTP_ERROR");
    }
}
