//! Rate-limit middleware
//!
//! Each route group is wrapped with a [`RateGate`] naming its policy class.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};

use pulse_services::{Admission, RateLimiter, RouteClass};

use crate::error::ApiError;
use crate::identity::caller_key;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Middleware state: the shared limiter and the class of the wrapped routes
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<RateLimiter>,
    class: RouteClass,
    trust_proxy: bool,
}

impl RateGate {
    pub fn new(limiter: &Arc<RateLimiter>, class: RouteClass, trust_proxy: bool) -> Self {
        Self {
            limiter: Arc::clone(limiter),
            class,
            trust_proxy,
        }
    }
}

/// Admit the request or answer 429 with `Retry-After`
pub async fn enforce(State(gate): State<RateGate>, request: Request, next: Next) -> Response {
    let caller = caller_key(request.headers(), request.extensions(), gate.trust_proxy);

    match gate.limiter.admit(&caller, gate.class) {
        Admission::Allowed { remaining } => {
            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response.headers_mut().insert(REMAINING_HEADER, value);
            }
            response
        }
        Admission::Blocked { retry_after } => ApiError::rate_limited(retry_after).into_response(),
    }
}
