//! Market endpoints

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use pulse_core::FearGreedReading;
use pulse_services::RouteClass;

use super::{limited, ItemsResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FearGreedResponse {
    fear_greed: Option<FearGreedReading>,
}

/// Create market routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/market", get(get_market))
        .route("/crypto", get(get_crypto))
        .route("/fear-greed", get(get_fear_greed));

    limited(router, state, RouteClass::Cached)
}

/// GET /api/market - Indices, crypto, forex and sentiment in one payload
async fn get_market(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.market.snapshot().await)
}

/// GET /api/crypto - Crypto quotes
async fn get_crypto(State(state): State<AppState>) -> impl IntoResponse {
    Json(ItemsResponse {
        items: state.market.crypto().await,
    })
}

/// GET /api/fear-greed - Fear & Greed index, `null` when unavailable
async fn get_fear_greed(State(state): State<AppState>) -> impl IntoResponse {
    Json(FearGreedResponse {
        fear_greed: state.market.fear_greed().await,
    })
}
