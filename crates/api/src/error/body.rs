use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Uniform error envelope returned for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    #[schema(example = 404)]
    pub status_code: u16,
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    pub message: String,
    /// Structured details, `null` when there are none.
    #[schema(value_type = Option<Object>)]
    pub errors: Option<Value>,
    pub path: String,
    pub method: String,
    pub request_id: String,
    /// ISO-8601 UTC with milliseconds.
    pub timestamp: String,
    /// Present outside production only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub exception_name: String,
    pub stack: Option<String>,
}

/// Minimal body used when the normalizing stage itself is bypassed,
/// e.g. for panics and errors rendered outside the layer stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackBody {
    pub request_id: String,
    pub error_code: String,
    pub message: String,
    pub timestamp: String,
    pub path: String,
}

impl FallbackBody {
    /// Reads request id and path from the ambient context when present.
    pub fn from_context(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        let context = nexusqr_context::current();

        Self {
            request_id: context
                .as_ref()
                .map(|c| c.request_id().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            error_code: error_code.into(),
            message: message.into(),
            timestamp: timestamp_now(),
            path: context
                .as_ref()
                .and_then(|c| c.path())
                .unwrap_or("/")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexusqr_context::{scope, RequestContext};
    use serde_json::json;

    fn body(debug: Option<DebugInfo>) -> ErrorBody {
        ErrorBody {
            success: false,
            status_code: 404,
            code: "NOT_FOUND".to_string(),
            message: "Cannot GET /missing".to_string(),
            errors: None,
            path: "/missing".to_string(),
            method: "GET".to_string(),
            request_id: "req-1".to_string(),
            timestamp: timestamp_now(),
            debug,
        }
    }

    #[test]
    fn test_error_body_field_names() {
        let json = serde_json::to_value(body(None)).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["errors"], Value::Null);
        assert!(json.get("debug").is_none());
    }

    #[test]
    fn test_debug_is_serialized_when_present() {
        let json = serde_json::to_value(body(Some(DebugInfo {
            exception_name: "HttpError".to_string(),
            stack: None,
        })))
        .unwrap();

        assert_eq!(json["debug"], json!({ "exceptionName": "HttpError", "stack": null }));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_fallback_outside_request_scope() {
        let body = FallbackBody::from_context("INTERNAL_SERVER_ERROR", "Internal server error");
        assert_eq!(body.request_id, "unknown");
        assert_eq!(body.path, "/");
    }

    #[tokio::test]
    async fn test_fallback_reads_request_scope() {
        let context = RequestContext::new("req-42").with_origin("POST", "/api/v1/items");
        let body = scope(context, async {
            FallbackBody::from_context("INTERNAL_SERVER_ERROR", "boom")
        })
        .await;

        assert_eq!(body.request_id, "req-42");
        assert_eq!(body.path, "/api/v1/items");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["errorCode"], "INTERNAL_SERVER_ERROR");
    }
}
