//! Request extractors that reject with [`ApiError`]
//!
//! Numeric query parameters are taken as strings and parsed here so a
//! malformed number becomes a localized 400 rather than a plain-text one.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use pulse_core::PageRequest;

use crate::error::ApiError;

/// `Query` with validation rejections
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        Ok(ValidQuery(value))
    }
}

/// `Json` with validation rejections
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        Ok(ValidJson(value))
    }
}

/// Parse an optional integer parameter. Blank counts as absent.
pub fn parse_int(field: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{field} is not a number: {value}"))),
        None => Ok(None),
    }
}

/// Clamped page request from raw `page` and `limit` parameters
pub fn page_request(
    page: Option<&str>,
    limit: Option<&str>,
    default_limit: u32,
    max_limit: u32,
) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::clamped(
        parse_int("page", page)?,
        parse_int("limit", limit)?,
        default_limit,
        max_limit,
    ))
}

/// Clamped `limit` for endpoints without paging
pub fn limit_param(raw: Option<&str>, default_limit: u32, max_limit: u32) -> Result<usize, ApiError> {
    Ok(page_request(None, raw, default_limit, max_limit)?.limit() as usize)
}

/// Non-blank value of an optional string parameter
pub fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
