//! API error responses
//!
//! Handlers return [`ApiError`]; its response carries the English message and
//! the catalog key, which [`localize_errors`] swaps for the caller's language.

use std::any::Any;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use pulse_core::PulseError;

use crate::i18n::{Locale, MessageKey};

#[derive(Debug, thiserror::Error)]
#[error("{status} {}: {detail}", .key.code())]
pub struct ApiError {
    status: StatusCode,
    key: MessageKey,
    /// Internal detail, logged but never sent to the client
    detail: String,
    retry_after: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, key: MessageKey, detail: impl Into<String>) -> Self {
        Self {
            status,
            key,
            detail: detail.into(),
            retry_after: None,
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, MessageKey::InvalidRequest, detail)
    }

    pub fn not_found(key: MessageKey, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, key, detail)
    }

    pub fn unauthorized(key: MessageKey, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, key, detail)
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(StatusCode::TOO_MANY_REQUESTS, MessageKey::RateLimited, "rate limited")
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            MessageKey::Timeout,
            format!("no response within {}ms", limit.as_millis()),
        )
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MessageKey::Internal, detail)
    }

    /// Use a resource-specific message for not-found errors
    pub fn or_not_found(mut self, key: MessageKey) -> Self {
        if self.status == StatusCode::NOT_FOUND {
            self.key = key;
        }
        self
    }

    /// Use a specific message for validation errors
    pub fn or_invalid(mut self, key: MessageKey) -> Self {
        if self.status == StatusCode::BAD_REQUEST {
            self.key = key;
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn key(&self) -> MessageKey {
        self.key
    }
}

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        match err {
            PulseError::Validation(detail) => ApiError::validation(detail),
            PulseError::NotFound(detail) => ApiError::not_found(MessageKey::NotFound, detail),
            PulseError::Unauthorized(detail) => {
                ApiError::unauthorized(MessageKey::SignInRequired, detail)
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("[API] {}", self);
        } else {
            debug!("[API] {}", self);
        }

        let mut response = (self.status, error_body(self.key, Locale::En)).into_response();
        if let Some(retry_after) = self.retry_after {
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response.extensions_mut().insert(self.key);
        response
    }
}

fn error_body(key: MessageKey, locale: Locale) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: key.message(locale),
        code: key.code(),
    })
}

/// Rewrite error bodies into the language of the request's `Accept-Language`
pub async fn localize_errors(request: Request, next: Next) -> Response {
    let locale = Locale::from_headers(request.headers());
    let mut response = next.run(request).await;

    if locale == Locale::En {
        return response;
    }
    let Some(key) = response.extensions().get::<MessageKey>().copied() else {
        return response;
    };

    match serde_json::to_vec(&error_body(key, locale).0) {
        Ok(bytes) => {
            response.headers_mut().remove(header::CONTENT_LENGTH);
            *response.body_mut() = Body::from(bytes);
        }
        Err(e) => error!("[API] Failed to localize error body: {}", e),
    }
    response
}

/// Abandon handlers that run past the deadline in the state, answering 408
pub async fn enforce_deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::timeout(limit).into_response(),
    }
}

/// Panic handler for `CatchPanicLayer`: a generic 500
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::internal(format!("handler panicked: {detail}")).into_response()
}
