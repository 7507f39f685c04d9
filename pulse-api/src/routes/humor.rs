//! Humor endpoints

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;

use pulse_core::HumorKind;
use pulse_services::RouteClass;

use super::{limited, ItemsResponse};
use crate::error::ApiError;
use crate::extract::{limit_param, non_blank, page_request, ValidQuery};
use crate::AppState;

const HUMOR_DEFAULT_LIMIT: u32 = 20;
const HUMOR_MAX_LIMIT: u32 = 50;
const TRENDING_DEFAULT_LIMIT: u32 = 10;
const TRENDING_MAX_LIMIT: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct HumorQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<String>,
}

/// Create humor routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/humor", get(list_humor))
        .route("/humor/trending", get(get_trending));

    limited(router, state, RouteClass::Cached)
}

/// GET /api/humor - Latest humor items, optionally of one type
async fn list_humor(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<HumorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = page_request(
        params.page.as_deref(),
        params.limit.as_deref(),
        HUMOR_DEFAULT_LIMIT,
        HUMOR_MAX_LIMIT,
    )?;
    let kind = non_blank(&params.kind)
        .map(str::parse::<HumorKind>)
        .transpose()?;

    Ok(Json(state.humor.list(kind, page).await))
}

/// GET /api/humor/trending - Most upvoted humor items
async fn get_trending(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<TrendingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = limit_param(params.limit.as_deref(), TRENDING_DEFAULT_LIMIT, TRENDING_MAX_LIMIT)?;
    Ok(Json(ItemsResponse {
        items: state.humor.trending(limit).await,
    }))
}
