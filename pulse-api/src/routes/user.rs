//! Per-user endpoints

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;

use pulse_services::RouteClass;

use super::limited;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::identity::UserId;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    pub news_id: String,
}

/// Create user routes
pub fn routes(state: &AppState) -> Router<AppState> {
    limited(
        Router::new().route("/user/bookmarks", post(toggle_bookmark)),
        state,
        RouteClass::Write,
    )
}

/// POST /api/user/bookmarks - Toggle a bookmark on a news item
async fn toggle_bookmark(
    State(state): State<AppState>,
    user: UserId,
    ValidJson(body): ValidJson<BookmarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .engagement
        .toggle_bookmark(user.as_deref(), &body.news_id)
        .await?;
    Ok(Json(receipt))
}
