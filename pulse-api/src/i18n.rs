//! Localized error messages
//!
//! Only the error-message catalog lives here; page content is localized by
//! the front end.

use axum::http::{header, HeaderMap};

/// Supported response languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next()?.trim().to_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "ko" => Some(Locale::Ko),
            _ => None,
        }
    }

    /// Best supported language of an `Accept-Language` value, honoring
    /// q-weights. Unsupported or missing preferences resolve to English.
    pub fn from_accept_language(value: &str) -> Self {
        let mut best: Option<(f32, Locale)> = None;

        for part in value.split(',') {
            let mut pieces = part.split(';');
            let tag = pieces.next().unwrap_or_default().trim();
            let weight = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            let Some(locale) = Locale::from_tag(tag) else {
                continue;
            };
            if weight > 0.0 && best.map_or(true, |(w, _)| weight > w) {
                best = Some((weight, locale));
            }
        }

        best.map(|(_, locale)| locale).unwrap_or_default()
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::from_accept_language)
            .unwrap_or_default()
    }
}

/// Catalog entry of a user-facing error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    InvalidRequest,
    SearchTooLong,
    InvalidTicker,
    SignInRequired,
    InvalidCronSecret,
    NotFound,
    NewsNotFound,
    BriefNotFound,
    ReportNotFound,
    PredictionNotFound,
    CollectorNotFound,
    RateLimited,
    Timeout,
    Internal,
}

impl MessageKey {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            MessageKey::InvalidRequest => "invalid_request",
            MessageKey::SearchTooLong => "search_too_long",
            MessageKey::InvalidTicker => "invalid_ticker",
            MessageKey::SignInRequired => "sign_in_required",
            MessageKey::InvalidCronSecret => "invalid_cron_secret",
            MessageKey::NotFound => "not_found",
            MessageKey::NewsNotFound => "news_not_found",
            MessageKey::BriefNotFound => "brief_not_found",
            MessageKey::ReportNotFound => "report_not_found",
            MessageKey::PredictionNotFound => "prediction_not_found",
            MessageKey::CollectorNotFound => "collector_not_found",
            MessageKey::RateLimited => "rate_limited",
            MessageKey::Timeout => "request_timeout",
            MessageKey::Internal => "internal_error",
        }
    }

    pub fn message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.english(),
            Locale::Ko => self.korean(),
        }
    }

    fn english(&self) -> &'static str {
        match self {
            MessageKey::InvalidRequest => "The request contains an invalid parameter.",
            MessageKey::SearchTooLong => "The search text is too long.",
            MessageKey::InvalidTicker => "One of the ticker symbols is invalid.",
            MessageKey::SignInRequired => "Please sign in to continue.",
            MessageKey::InvalidCronSecret => "Invalid or missing authorization.",
            MessageKey::NotFound => "The requested resource was not found.",
            MessageKey::NewsNotFound => "This article could not be found.",
            MessageKey::BriefNotFound => "No brief is available for this date.",
            MessageKey::ReportNotFound => "This report has not been generated yet.",
            MessageKey::PredictionNotFound => "This prediction does not exist or is closed.",
            MessageKey::CollectorNotFound => "Unknown collector.",
            MessageKey::RateLimited => "Too many requests. Please try again shortly.",
            MessageKey::Timeout => "The request took too long. Please try again.",
            MessageKey::Internal => "Something went wrong. Please try again later.",
        }
    }

    fn korean(&self) -> &'static str {
        match self {
            MessageKey::InvalidRequest => "요청에 잘못된 값이 포함되어 있습니다.",
            MessageKey::SearchTooLong => "검색어가 너무 깁니다.",
            MessageKey::InvalidTicker => "잘못된 종목 코드가 포함되어 있습니다.",
            MessageKey::SignInRequired => "로그인이 필요합니다.",
            MessageKey::InvalidCronSecret => "인증 정보가 없거나 올바르지 않습니다.",
            MessageKey::NotFound => "요청한 항목을 찾을 수 없습니다.",
            MessageKey::NewsNotFound => "기사를 찾을 수 없습니다.",
            MessageKey::BriefNotFound => "해당 날짜의 브리핑이 없습니다.",
            MessageKey::ReportNotFound => "아직 생성되지 않은 리포트입니다.",
            MessageKey::PredictionNotFound => "존재하지 않거나 마감된 예측입니다.",
            MessageKey::CollectorNotFound => "알 수 없는 수집기입니다.",
            MessageKey::RateLimited => "요청이 너무 많습니다. 잠시 후 다시 시도해 주세요.",
            MessageKey::Timeout => "요청 처리 시간이 초과되었습니다. 다시 시도해 주세요.",
            MessageKey::Internal => "문제가 발생했습니다. 잠시 후 다시 시도해 주세요.",
        }
    }
}
