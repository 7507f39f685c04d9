//! Normalized news items

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PulseError;

/// Closed set of news categories the dashboard groups articles into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    International,
    Economy,
    Tech,
    Politics,
    Risk,
    Culture,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 6] = [
        NewsCategory::International,
        NewsCategory::Economy,
        NewsCategory::Tech,
        NewsCategory::Politics,
        NewsCategory::Risk,
        NewsCategory::Culture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::International => "international",
            NewsCategory::Economy => "economy",
            NewsCategory::Tech => "tech",
            NewsCategory::Politics => "politics",
            NewsCategory::Risk => "risk",
            NewsCategory::Culture => "culture",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "international" | "world" => Ok(NewsCategory::International),
            "economy" | "business" => Ok(NewsCategory::Economy),
            "tech" | "technology" => Ok(NewsCategory::Tech),
            "politics" => Ok(NewsCategory::Politics),
            "risk" => Ok(NewsCategory::Risk),
            "culture" => Ok(NewsCategory::Culture),
            other => Err(PulseError::validation(format!("unknown category: {other}"))),
        }
    }
}

/// A normalized news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Stable, source-scoped identifier (hash of source and URL)
    pub id: String,
    /// Original headline
    pub title: String,
    /// Headline translated into the dashboard language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_translated: Option<String>,
    /// Display name of the publisher
    pub source: String,
    /// ISO 3166-1 alpha-2 country code, uppercase
    pub country: String,
    pub category: NewsCategory,
    pub published_at: DateTime<Utc>,
    /// Popularity (upvotes, points, or editorial weight)
    pub score: u64,
    pub url: String,
    /// Plain-text excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Ticker symbols the provider associated with the article
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickers: Vec<String>,
}

impl NewsItem {
    /// Set the translated headline, keeping it only when it differs from the
    /// original. Returns whether a translation was stored.
    pub fn apply_translation(&mut self, translated: &str) -> bool {
        let translated = translated.trim();
        if translated.is_empty() || translated == self.title.trim() {
            return false;
        }
        self.title_translated = Some(translated.to_string());
        true
    }

    /// Whether the headline still needs a translation
    pub fn needs_translation(&self) -> bool {
        self.title_translated.is_none()
    }
}

/// Response for country-scoped news
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryNews {
    pub items: Vec<NewsItem>,
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(title: &str) -> NewsItem {
        NewsItem {
            id: "abc".to_string(),
            title: title.to_string(),
            title_translated: None,
            source: "Example".to_string(),
            country: "US".to_string(),
            category: NewsCategory::Tech,
            published_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            score: 0,
            url: "https://example.com/a".to_string(),
            summary: None,
            tickers: vec![],
        }
    }

    #[test]
    fn test_translation_identical_to_title_is_ignored() {
        let mut news = item("Hello world");
        assert!(!news.apply_translation("Hello world"));
        assert!(!news.apply_translation("  Hello world  "));
        assert!(news.title_translated.is_none());
    }

    #[test]
    fn test_translation_stored_when_different() {
        let mut news = item("Bonjour le monde");
        assert!(news.apply_translation("Hello world"));
        assert_eq!(news.title_translated.as_deref(), Some("Hello world"));
        assert!(!news.needs_translation());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Tech".parse::<NewsCategory>().unwrap(), NewsCategory::Tech);
        assert_eq!(" economy ".parse::<NewsCategory>().unwrap(), NewsCategory::Economy);
        assert!("sports".parse::<NewsCategory>().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut news = item("Title");
        news.apply_translation("Titre");
        let json = serde_json::to_value(&news).unwrap();
        assert_eq!(json["titleTranslated"], "Titre");
        assert_eq!(json["category"], "tech");
        assert!(json.get("tickers").is_none());
    }
}
