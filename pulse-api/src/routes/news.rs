//! News endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use pulse_core::{FeedQuery, NewsCategory, SortOrder};
use pulse_services::RouteClass;

use super::{limited, ItemsResponse};
use crate::error::ApiError;
use crate::extract::{limit_param, non_blank, page_request, ValidQuery};
use crate::i18n::MessageKey;
use crate::AppState;

/// Longest search text accepted before sanitizing
const SEARCH_INPUT_MAX_LEN: usize = 500;

const NEWS_DEFAULT_LIMIT: u32 = 20;
const NEWS_MAX_LIMIT: u32 = 50;
const TRENDS_DEFAULT_LIMIT: u32 = 10;
const TRENDS_MAX_LIMIT: u32 = 30;

/// Query parameters for the news feed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsQuery {
    pub category: Option<String>,
    pub country: Option<String>,
    pub source: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub search: Option<String>,
}

/// Query parameters for a country feed
#[derive(Debug, Deserialize)]
pub struct CountryQuery {
    pub country: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

/// Create news routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let cached = Router::new()
        .route("/news", get(list_news))
        .route("/news/{id}", get(get_news))
        .route("/trends", get(get_trends));
    let uncached = Router::new().route("/news/country", get(get_country_news));

    limited(cached, state, RouteClass::Cached).merge(limited(uncached, state, RouteClass::Uncached))
}

/// Two-letter country code, uppercased
fn parse_country(raw: &str) -> Result<String, ApiError> {
    let country = raw.trim();
    if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(country.to_uppercase())
    } else {
        Err(ApiError::validation(format!("invalid country: {raw}")))
    }
}

fn feed_query(params: &NewsQuery) -> Result<FeedQuery, ApiError> {
    let page = page_request(
        params.page.as_deref(),
        params.limit.as_deref(),
        NEWS_DEFAULT_LIMIT,
        NEWS_MAX_LIMIT,
    )?;
    let mut query = FeedQuery::new(page);

    if let Some(raw) = non_blank(&params.category) {
        query = query.with_category(raw.parse::<NewsCategory>()?);
    }
    if let Some(raw) = non_blank(&params.country) {
        query = query.with_country(&parse_country(raw)?);
    }
    if let Some(raw) = non_blank(&params.source) {
        query = query.with_source(raw);
    }
    if let Some(raw) = params.sort_by.as_deref() {
        query = query.with_sort(raw.parse::<SortOrder>()?);
    }
    if let Some(raw) = params.search.as_deref() {
        if raw.chars().count() > SEARCH_INPUT_MAX_LEN {
            return Err(ApiError::validation("search text too long").or_invalid(MessageKey::SearchTooLong));
        }
        query = query.with_search(raw);
    }

    Ok(query)
}

/// GET /api/news - Filtered, sorted, paginated news feed
async fn list_news(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<NewsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = feed_query(&params)?;
    debug!("[API] news query: {:?}", query);
    Ok(Json(state.news.list(&query).await))
}

/// GET /api/news/{id} - One news item
async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .news
        .get(&id)
        .await
        .map_err(|e| ApiError::from(e).or_not_found(MessageKey::NewsNotFound))?;
    Ok(Json(item))
}

/// GET /api/news/country - Latest news of one country, translated
async fn get_country_news(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<CountryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let country = non_blank(&params.country)
        .ok_or_else(|| ApiError::validation("country is required"))
        .and_then(parse_country)?;
    let limit = limit_param(params.limit.as_deref(), NEWS_DEFAULT_LIMIT, NEWS_MAX_LIMIT)?;

    Ok(Json(state.news.by_country(&country, limit).await))
}

/// GET /api/trends - Trending news
async fn get_trends(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = limit_param(params.limit.as_deref(), TRENDS_DEFAULT_LIMIT, TRENDS_MAX_LIMIT)?;
    Ok(Json(ItemsResponse {
        items: state.news.trends(limit).await,
    }))
}
