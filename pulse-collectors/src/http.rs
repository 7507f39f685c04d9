//! Shared HTTP plumbing for provider adapters

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::CollectError;

/// Default per-request timeout for provider calls
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client carrying the collector's own identity
pub(crate) fn build_client(user_agent: &str) -> Client {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and return the body of a successful response
pub(crate) async fn fetch_bytes(request: RequestBuilder) -> Result<Vec<u8>, CollectError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CollectError::RateLimited);
    }

    if !status.is_success() {
        return Err(CollectError::ApiError {
            status: status.as_u16(),
            message: format!("Request to {} failed", response.url()),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

/// Send a request and decode a successful JSON response
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, CollectError> {
    let body = fetch_bytes(request).await?;
    serde_json::from_slice(&body).map_err(|e| CollectError::ParseError(e.to_string()))
}
