//! Daily brief and weekly report endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use pulse_core::{parse_week_start, week_start_of, Industry};
use pulse_services::RouteClass;

use super::limited;
use crate::error::ApiError;
use crate::extract::{non_blank, ValidQuery};
use crate::i18n::MessageKey;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub industry: Option<String>,
    pub week_start: Option<String>,
}

/// Create brief routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let cached = Router::new()
        .route("/brief/{date}", get(get_brief_by_date))
        .route("/reports", get(get_report));
    // Today's brief may be generated on request
    let uncached = Router::new().route("/brief/today", get(get_today_brief));

    limited(cached, state, RouteClass::Cached).merge(limited(uncached, state, RouteClass::Uncached))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("invalid date: {raw}")))
}

/// GET /api/brief/today
async fn get_today_brief(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let brief = state
        .briefs
        .today(today)
        .await
        .map_err(|e| ApiError::from(e).or_not_found(MessageKey::BriefNotFound))?;
    Ok(Json(brief))
}

/// GET /api/brief/{date} - Brief of a past day (`YYYY-MM-DD`)
async fn get_brief_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date(&date)?;
    let today = Utc::now().date_naive();
    let brief = state
        .briefs
        .by_date(date, today)
        .await
        .map_err(|e| ApiError::from(e).or_not_found(MessageKey::BriefNotFound))?;
    Ok(Json(brief))
}

/// GET /api/reports - Weekly report of one industry
async fn get_report(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let industry = non_blank(&params.industry)
        .ok_or_else(|| ApiError::validation("industry is required"))?
        .parse::<Industry>()?;
    let week_start = match non_blank(&params.week_start) {
        Some(raw) => parse_week_start(raw)?,
        None => week_start_of(Utc::now().date_naive()),
    };

    let report = state
        .briefs
        .report(industry, week_start)
        .await
        .map_err(|e| ApiError::from(e).or_not_found(MessageKey::ReportNotFound))?;
    Ok(Json(report))
}
