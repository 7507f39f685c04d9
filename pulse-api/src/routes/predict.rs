//! Prediction poll endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use pulse_core::VoteChoice;
use pulse_services::RouteClass;

use super::{limited, ItemsResponse};
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::i18n::MessageKey;
use crate::identity::UserId;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub choice: String,
}

/// Create prediction routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let reads = Router::new().route("/predict", get(list_predictions));
    let writes = Router::new().route("/predict/{id}/vote", post(vote));

    limited(reads, state, RouteClass::Cached).merge(limited(writes, state, RouteClass::Write))
}

/// GET /api/predict - Open polls
async fn list_predictions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state.engagement.predictions(Utc::now()).await?;
    Ok(Json(ItemsResponse { items }))
}

/// POST /api/predict/{id}/vote - Vote `a` or `b`
async fn vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: UserId,
    ValidJson(body): ValidJson<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let choice = body.choice.parse::<VoteChoice>()?;
    let receipt = state
        .engagement
        .vote(&id, user.as_deref(), choice, Utc::now())
        .await
        .map_err(|e| ApiError::from(e).or_not_found(MessageKey::PredictionNotFound))?;
    Ok(Json(receipt))
}
