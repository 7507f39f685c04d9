//! Caller identity
//!
//! Sessions are issued upstream; an authenticated request arrives with the
//! user id in the `x-user-id` header.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
};

pub const USER_ID_HEADER: &str = "x-user-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
/// Longest accepted user id
const MAX_USER_ID_LEN: usize = 128;

/// Authenticated user id, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub Option<String>);

impl UserId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_USER_ID_LEN)
            .map(str::to_string);
        UserId(user_id)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UserId::from_headers(&parts.headers))
    }
}

/// Key a caller is rate limited under: the first `X-Forwarded-For` hop when
/// a trusted proxy sets it, else the peer address, else `anonymous`.
/// Client-supplied identity headers are never part of the key.
pub fn caller_key(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return format!("ip:{ip}");
        }
    }

    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return format!("ip:{}", addr.ip());
    }

    "anonymous".to_string()
}
