//! Scheduler-triggered batch endpoints, guarded by the shared cron secret

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use pulse_services::RouteClass;

use super::limited;
use crate::error::ApiError;
use crate::i18n::MessageKey;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CronResponse {
    pub success: bool,
    pub collected: usize,
    pub timestamp: DateTime<Utc>,
}

/// Create cron routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/cron/collect/{collector}", post(collect))
        .route("/cron/reports", post(generate_reports));

    limited(router, state, RouteClass::Collect)
}

/// Compare without short-circuiting on the first differing byte
fn secrets_match(given: &[u8], expected: &[u8]) -> bool {
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Require `Authorization: Bearer <CRON_SECRET>`. With no secret configured
/// every call is refused.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.cron_secret.as_deref() else {
        return Err(ApiError::unauthorized(
            MessageKey::InvalidCronSecret,
            "cron secret not configured",
        ));
    };

    let given = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match given {
        Some(token) if secrets_match(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ApiError::unauthorized(
            MessageKey::InvalidCronSecret,
            "invalid cron secret",
        )),
    }
}

/// POST /api/cron/collect/{collector} - Run one collector now
async fn collect(
    State(state): State<AppState>,
    Path(collector): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;

    let collected = match state.news.collect_from(&collector).await {
        Some(n) => Some(n),
        None => match state.market.collect_from(&collector).await {
            Some(n) => Some(n),
            None => state.humor.collect_from(&collector).await,
        },
    };
    let Some(collected) = collected else {
        return Err(ApiError::not_found(
            MessageKey::CollectorNotFound,
            format!("collector {collector}"),
        ));
    };

    info!("[CRON] {} collected {} items", collector, collected);
    Ok(Json(CronResponse {
        success: true,
        collected,
        timestamp: Utc::now(),
    }))
}

/// POST /api/cron/reports - Generate this week's industry reports
async fn generate_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;

    let now = Utc::now();
    let collected = state.briefs.generate_weekly_reports(now.date_naive(), now).await;

    info!("[CRON] Generated {} weekly reports", collected);
    Ok(Json(CronResponse {
        success: true,
        collected,
        timestamp: now,
    }))
}
