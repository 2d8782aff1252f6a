// Error taxonomy and normalization for the HTTP boundary

pub mod app;
pub mod body;
pub mod database;
pub mod generic;
pub mod http;
pub mod pipeline;

pub use app::AppError;
pub use body::{DebugInfo, ErrorBody, FallbackBody};
pub use database::DatabaseFailure;
pub use http::{HttpError, HttpPayload};
pub use pipeline::{
    Classification, Classifier, ErrorPipeline, ErrorPolicy, NormalizedError, RequestMeta,
};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nexusqr_context::ContextError;
use nexusqr_database::DatabaseError;
use std::error::Error as _;
use std::sync::Arc;
use thiserror::Error;

/// Every failure a handler can produce, tagged by origin.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Database(#[from] DatabaseFailure),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        match DatabaseFailure::from_sqlx(&error) {
            Some(failure) => Self::Database(failure),
            None => Self::Internal(error.into()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Sqlx(error) => error.into(),
            other => Self::Internal(other.into()),
        }
    }
}

impl ApiError {
    pub fn name(&self) -> &'static str {
        match self {
            Self::App(error) => error.name(),
            Self::Http(_) => "HttpError",
            Self::Database(_) => "QueryFailedError",
            Self::Context(ContextError::Missing) => "ContextMissingError",
            Self::Context(ContextError::MissingRequiredField(_)) => "ContextFieldMissingError",
            Self::Internal(_) => "Error",
        }
    }

    /// Cause chain rendering used as the debug stack.
    pub fn stack(&self) -> Option<String> {
        match self {
            Self::Internal(error) => Some(format!("{:?}", error)),
            _ => {
                let mut causes = Vec::new();
                let mut source = self.source();
                while let Some(cause) = source {
                    causes.push(cause.to_string());
                    source = cause.source();
                }
                (!causes.is_empty()).then(|| causes.join("\ncaused by: "))
            }
        }
    }

    fn fallback_parts(&self) -> (StatusCode, &str) {
        match self {
            Self::App(error) => (error.status(), error.code()),
            Self::Http(error) => (error.status(), generic::code_for_status(error.status())),
            Self::Context(ContextError::MissingRequiredField(_)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

/// Marker left on responses rendered straight from an [`ApiError`]; the
/// normalization middleware takes it out and rebuilds the full body.
#[derive(Debug, Clone)]
pub struct UnhandledError(pub Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.fallback_parts();
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = FallbackBody::from_context(code, message);
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(UnhandledError(Arc::new(self)));
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
