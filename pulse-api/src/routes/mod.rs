//! API route definitions

mod brief;
mod cron;
mod health;
mod humor;
mod market;
mod news;
mod predict;
mod user;
mod watchdog;

use axum::{middleware, Router};
use serde::Serialize;

use pulse_services::RouteClass;

use crate::rate_limit::{enforce, RateGate};
use crate::AppState;

/// `{items}` body of the unpaged list endpoints
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

/// Wrap every route of `router` with the rate limit of `class`
fn limited(router: Router<AppState>, state: &AppState, class: RouteClass) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        RateGate::new(&state.rate_limiter, class, state.config.trust_proxy),
        enforce,
    ))
}

/// Create all API routes
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(news::routes(state))
        .merge(market::routes(state))
        .merge(humor::routes(state))
        .merge(watchdog::routes(state))
        .merge(brief::routes(state))
        .merge(predict::routes(state))
        .merge(user::routes(state))
        .merge(cron::routes(state))
        .merge(health::routes())
}
