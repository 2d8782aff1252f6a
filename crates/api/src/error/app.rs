use axum::http::StatusCode;
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

/// Domain errors raised deliberately by handlers and services. Each one
/// already knows its status, code and client-safe message.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Database {
        message: String,
        details: Option<Value>,
    },

    #[error("{message}")]
    Custom {
        status: StatusCode,
        code: Cow<'static, str>,
        message: String,
        details: Option<Value>,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// "`resource` with ID `id` not found", or "`resource` not found".
    pub fn not_found(resource: &str, id: Option<&str>) -> Self {
        let message = match id {
            Some(id) => format!("{} with ID {} not found", resource, id),
            None => format!("{} not found", resource),
        };
        Self::NotFound { message }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn invalid_credentials() -> Self {
        Self::unauthorized("Invalid credentials")
    }

    pub fn account_inactive() -> Self {
        Self::unauthorized("Account is not active")
    }

    pub fn tenant_inactive() -> Self {
        Self::unauthorized("Organization account is suspended")
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            details: None,
        }
    }

    pub fn custom(
        status: StatusCode,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self::Custom {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details; variants without a details slot are
    /// returned unchanged.
    pub fn with_details(mut self, value: Value) -> Self {
        match &mut self {
            Self::Validation { details, .. }
            | Self::Database { details, .. }
            | Self::Custom { details, .. } => *details = Some(value),
            Self::NotFound { .. } | Self::Unauthorized(_) => {}
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Custom { status, .. } => *status,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::NotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Custom { code, .. } => code.as_ref(),
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Validation { details, .. }
            | Self::Database { details, .. }
            | Self::Custom { details, .. } => details.as_ref(),
            Self::NotFound { .. } | Self::Unauthorized(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Unauthorized(_) => "UnauthorizedError",
            Self::Database { .. } => "DatabaseError",
            Self::Custom { .. } => "AppError",
        }
    }
}
