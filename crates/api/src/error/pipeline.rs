use super::body::{timestamp_now, DebugInfo, ErrorBody};
use super::{database, generic, ApiError};
use crate::config::Environment;
use crate::logging;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

/// Canonical shape every classifier produces.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl NormalizedError {
    fn unclassified() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_SERVER_ERROR".to_string(),
            message: "Internal server error".to_string(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Normalized(NormalizedError),
    Declined,
}

/// `production` is passed so classifiers can withhold internal messages.
pub type ClassifierFn = fn(&ApiError, bool) -> Classification;

#[derive(Clone, Copy)]
pub struct Classifier {
    pub name: &'static str,
    pub classify: ClassifierFn,
}

pub const DATABASE: Classifier = Classifier {
    name: "database",
    classify: database::classify,
};

pub const APPLICATION: Classifier = Classifier {
    name: "application",
    classify: generic::classify,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorPolicy {
    pub production: bool,
}

impl ErrorPolicy {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            production: environment.is_production(),
        }
    }
}

/// Where the failing request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub request_id: String,
    pub method: String,
    pub path: String,
}

impl RequestMeta {
    /// Request id comes from the ambient context, `"unknown"` outside one.
    pub fn new(method: &Method, uri: &Uri) -> Self {
        Self {
            request_id: nexusqr_context::request_id()
                .unwrap_or_else(|| "unknown".to_string()),
            method: method.to_string(),
            path: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string()),
        }
    }
}

/// Ordered classifier chain. The first classifier that does not decline
/// decides the outcome.
pub struct ErrorPipeline {
    classifiers: Vec<Classifier>,
    policy: ErrorPolicy,
}

impl ErrorPipeline {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self::with_classifiers(policy, vec![DATABASE, APPLICATION])
    }

    pub fn with_classifiers(policy: ErrorPolicy, classifiers: Vec<Classifier>) -> Self {
        Self { classifiers, policy }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn classifier_names(&self) -> Vec<&'static str> {
        self.classifiers.iter().map(|c| c.name).collect()
    }

    pub fn classify(&self, error: &ApiError) -> NormalizedError {
        self.classifiers
            .iter()
            .find_map(|c| match (c.classify)(error, self.policy.production) {
                Classification::Normalized(normalized) => Some(normalized),
                Classification::Declined => None,
            })
            .unwrap_or_else(NormalizedError::unclassified)
    }

    pub fn normalize(&self, error: &ApiError, meta: &RequestMeta) -> ErrorBody {
        let normalized = self.classify(error);

        let debug = (!self.policy.production).then(|| DebugInfo {
            exception_name: error.name().to_string(),
            stack: error.stack(),
        });

        ErrorBody {
            success: false,
            status_code: normalized.status.as_u16(),
            code: normalized.code,
            message: normalized.message,
            errors: normalized.details,
            path: meta.path.clone(),
            method: meta.method.clone(),
            request_id: meta.request_id.clone(),
            timestamp: timestamp_now(),
            debug,
        }
    }

    /// Normalizes, logs once, and renders the JSON response.
    pub fn respond(&self, error: &ApiError, meta: &RequestMeta) -> Response {
        let body = self.normalize(error, meta);
        self.log(error, meta, &body);

        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }

    fn log(&self, error: &ApiError, meta: &RequestMeta, body: &ErrorBody) {
        let details = body
            .errors
            .as_ref()
            .map(|errors| logging::redacted(errors).to_string());

        if body.status_code >= 500 {
            tracing::error!(
                request_id = %meta.request_id,
                method = %meta.method,
                path = %meta.path,
                status = body.status_code,
                error_name = error.name(),
                error_code = %body.code,
                details = details.as_deref(),
                stack = error.stack().as_deref(),
                "{} {} - {} {}",
                meta.method,
                meta.path,
                body.status_code,
                error
            );
        } else {
            tracing::warn!(
                request_id = %meta.request_id,
                method = %meta.method,
                path = %meta.path,
                status = body.status_code,
                error_name = error.name(),
                error_code = %body.code,
                details = details.as_deref(),
                "{} {} - {} {}",
                meta.method,
                meta.path,
                body.status_code,
                error
            );
        }
    }
}
