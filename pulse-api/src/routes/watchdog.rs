//! Watchdog endpoint: news mentioning a caller's tickers

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;

use pulse_core::NewsItem;
use pulse_services::{parse_watchlist, watchdog, RouteClass};

use super::limited;
use crate::error::ApiError;
use crate::extract::{page_request, ValidQuery};
use crate::i18n::MessageKey;
use crate::AppState;

const WATCHDOG_DEFAULT_LIMIT: u32 = 20;
const WATCHDOG_MAX_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct WatchdogQuery {
    /// Comma-separated ticker symbols
    pub tickers: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Create watchdog routes
pub fn routes(state: &AppState) -> Router<AppState> {
    limited(
        Router::new().route("/watchdog", get(get_watchdog)),
        state,
        RouteClass::Cached,
    )
}

/// GET /api/watchdog - Paginated news matching any watched ticker
async fn get_watchdog(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<WatchdogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = page_request(
        params.page.as_deref(),
        params.limit.as_deref(),
        WATCHDOG_DEFAULT_LIMIT,
        WATCHDOG_MAX_LIMIT,
    )?;
    let tickers = parse_watchlist(params.tickers.as_deref().unwrap_or_default())
        .map_err(|e| ApiError::from(e).or_invalid(MessageKey::InvalidTicker))?;

    // No pool fetch for an empty watchlist
    if tickers.is_empty() {
        return Ok(Json(page.empty::<NewsItem>()));
    }

    let pool = state.news.pool().await;
    Ok(Json(watchdog::watch(&pool, &tickers, page)))
}
