use super::pipeline::{Classification, NormalizedError};
use super::ApiError;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use sqlx::postgres::PgDatabaseError;
use std::fmt;

pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const NOT_NULL_VIOLATION: &str = "23502";

/// A failure reported by PostgreSQL itself, carrying its SQLSTATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseFailure {
    pub code: String,
    pub message: String,
    pub constraint: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub detail: Option<String>,
}

impl DatabaseFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            constraint: None,
            table: None,
            column: None,
            detail: None,
        }
    }

    /// Extracts the SQLSTATE shape from a driver error. `None` when the
    /// error did not come from the server (pool timeouts, I/O, decoding).
    pub fn from_sqlx(error: &sqlx::Error) -> Option<Self> {
        let db = error.as_database_error()?;
        let code = db.code()?.into_owned();

        let mut failure = Self::new(code, db.message());
        failure.constraint = db.constraint().map(str::to_string);
        failure.table = db.table().map(str::to_string);

        if let Some(pg) = db.try_downcast_ref::<PgDatabaseError>() {
            failure.column = pg.column().map(str::to_string);
            failure.detail = pg.detail().map(str::to_string);
        }

        Some(failure)
    }

    fn details(&self) -> Value {
        let mut details = Map::new();
        details.insert("code".to_string(), Value::String(self.code.clone()));
        details.insert("message".to_string(), Value::String(self.message.clone()));

        let optional = [
            ("constraint", &self.constraint),
            ("table", &self.table),
            ("column", &self.column),
            ("detail", &self.detail),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                details.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        Value::Object(details)
    }
}

impl fmt::Display for DatabaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (SQLSTATE {})", self.message, self.code)
    }
}

impl std::error::Error for DatabaseFailure {}

/// Maps server-reported failures by SQLSTATE; declines everything else.
pub fn classify(error: &ApiError, _production: bool) -> Classification {
    let ApiError::Database(failure) = error else {
        return Classification::Declined;
    };

    let (status, code, message) = match failure.code.as_str() {
        UNIQUE_VIOLATION => (
            StatusCode::CONFLICT,
            "UNIQUE_CONSTRAINT_VIOLATION",
            "A record with this value already exists",
        ),
        FOREIGN_KEY_VIOLATION => (
            StatusCode::BAD_REQUEST,
            "FOREIGN_KEY_VIOLATION",
            "Referenced record does not exist",
        ),
        NOT_NULL_VIOLATION => (
            StatusCode::BAD_REQUEST,
            "NULL_CONSTRAINT_VIOLATION",
            "Required field cannot be empty",
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "Database operation failed",
        ),
    };

    Classification::Normalized(NormalizedError {
        status,
        code: code.to_string(),
        message: message.to_string(),
        details: Some(failure.details()),
    })
}
