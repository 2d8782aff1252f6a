use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use serde_json::{json, Map, Value};
use std::fmt;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, PartialEq)]
pub enum HttpPayload {
    Text(String),
    Object(Map<String, Value>),
}

/// Framework-level failure: a status plus whatever payload produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    status: StatusCode,
    payload: HttpPayload,
}

impl HttpError {
    pub fn new(status: StatusCode, payload: HttpPayload) -> Self {
        Self { status, payload }
    }

    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, HttpPayload::Text(message.into()))
    }

    /// Objects are kept as-is, strings become text payloads, anything else
    /// is wrapped as `{"message": value}`.
    pub fn json(status: StatusCode, value: Value) -> Self {
        let payload = match value {
            Value::Object(map) => HttpPayload::Object(map),
            Value::String(text) => HttpPayload::Text(text),
            other => {
                let mut map = Map::new();
                map.insert("message".to_string(), other);
                HttpPayload::Object(map)
            }
        };
        Self::new(status, payload)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::text(StatusCode::NOT_FOUND, message)
    }

    /// 400 with the field messages sorted by path, nested fields dotted.
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(errors, "", &mut messages);
        messages.sort_by(|a, b| a.0.cmp(&b.0));

        let messages: Vec<String> = messages.into_iter().map(|(_, message)| message).collect();
        Self::json(
            StatusCode::BAD_REQUEST,
            json!({
                "statusCode": 400,
                "message": messages,
                "error": "Bad Request",
            }),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> &HttpPayload {
        &self.payload
    }

    /// The payload's `message` field (for object payloads).
    pub fn payload_message(&self) -> Option<&Value> {
        match &self.payload {
            HttpPayload::Object(map) => map.get("message"),
            HttpPayload::Text(_) => None,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            HttpPayload::Text(text) => f.write_str(text),
            HttpPayload::Object(_) => match self.payload_message() {
                Some(Value::String(message)) => f.write_str(message),
                Some(Value::Array(items)) => f.write_str(&join_messages(items)),
                _ => f.write_str(self.status.canonical_reason().unwrap_or("Request failed")),
            },
        }
    }
}

impl std::error::Error for HttpError {}

pub(crate) fn join_messages(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self::text(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        Self::text(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        Self::text(rejection.status(), rejection.body_text())
    }
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.push((path.clone(), field_message(&path, error)));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

// Custom messages are written as predicates ("must be ...") and get the
// field path prepended.
fn field_message(path: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("{} {}", path, message);
    }

    let param = |name: &str| error.params.get(name).map(|v| v.to_string());

    let predicate = match &*error.code {
        "email" => "must be a valid email address".to_string(),
        "url" => "must be a valid URL".to_string(),
        "required" => "is required".to_string(),
        "must_match" => "does not match".to_string(),
        "length" => match (param("min"), param("max"), param("equal")) {
            (_, _, Some(equal)) => format!("must be exactly {} characters", equal),
            (Some(min), Some(max), _) => format!("must be between {} and {} characters", min, max),
            (Some(min), None, _) => format!("must be at least {} characters", min),
            (None, Some(max), _) => format!("must be at most {} characters", max),
            (None, None, _) => "has an invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            (Some(min), None) => format!("must not be less than {}", min),
            (None, Some(max)) => format!("must not be greater than {}", max),
            (None, None) => "is out of range".to_string(),
        },
        _ => "is invalid".to_string(),
    };

    format!("{} {}", path, predicate)
}
