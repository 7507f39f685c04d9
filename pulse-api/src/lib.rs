//! Pulse Dashboard API
//!
//! HTTP surface over the dashboard services: news, market, humor, briefs,
//! predictions and the cron triggers.

pub mod error;
pub mod extract;
pub mod i18n;
pub mod identity;
pub mod rate_limit;
mod routes;
pub mod state;

use axum::{
    http::{header, HeaderName, Method},
    middleware, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::ApiError;
pub use state::AppState;

use error::{enforce_deadline, localize_errors, panic_response};
use i18n::MessageKey;

/// Unmatched paths
async fn not_found() -> ApiError {
    ApiError::not_found(MessageKey::NotFound, "no such route")
}

/// Build the full application router. Panics and timeouts are turned into
/// error responses inside the localization layer so their bodies are
/// localized too.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT_LANGUAGE,
            HeaderName::from_static(identity::USER_ID_HEADER),
        ]);

    Router::new()
        .nest("/api", routes::api_routes(&state))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            state.config.request_timeout,
            enforce_deadline,
        ))
        .layer(middleware::from_fn(localize_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
