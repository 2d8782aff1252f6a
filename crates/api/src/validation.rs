// Request body/query validation and the custom formats used by DTOs

use crate::error::{ApiError, HttpError};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::{async_trait, Json};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref SLUG: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref ETHIOPIAN_PHONE: Regex = Regex::new(r"^(?:\+251|0)[79]\d{8}$").unwrap();
    static ref TENANT_ID: Regex = Regex::new(r"^tenant_[A-Za-z0-9]{16}$").unwrap();
    static ref UUID: Regex =
        Regex::new(r"^[0-9a-fA-F]{8}-([0-9a-fA-F]{4}-){3}[0-9a-fA-F]{12}$").unwrap();
}

fn check_format(
    pattern: &Regex,
    value: &str,
    code: &'static str,
    message: &'static str,
) -> Result<(), ValidationError> {
    if pattern.is_match(value) {
        return Ok(());
    }
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

/// Lowercase words separated by single hyphens.
pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    check_format(&SLUG, value, "slug", "must be a lowercase slug")
}

/// `+2519XXXXXXXX`, `+2517XXXXXXXX`, `09XXXXXXXX` or `07XXXXXXXX`.
pub fn validate_ethiopian_phone(value: &str) -> Result<(), ValidationError> {
    check_format(
        &ETHIOPIAN_PHONE,
        value,
        "ethiopian_phone",
        "must be a valid Ethiopian phone number",
    )
}

pub fn validate_tenant_id(value: &str) -> Result<(), ValidationError> {
    check_format(&TENANT_ID, value, "tenant_id", "must be a valid tenant ID")
}

pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    check_format(&UUID, value, "uuid", "must be a UUID")
}

/// JSON body that has passed `validator` checks.
///
/// Malformed bodies and failed checks are rejected as [`HttpError`]s and
/// rendered through the normal error pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpError::from)?;

        value
            .validate()
            .map_err(|errors| HttpError::from_validation(&errors))?;

        Ok(Self(value))
    }
}

/// Query string counterpart of [`ValidatedJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpError::from)?;

        value
            .validate()
            .map_err(|errors| HttpError::from_validation(&errors))?;

        Ok(Self(value))
    }
}
