//! Raw provider records
//!
//! Collectors hand these to the normalizer untouched: every field a provider
//! may omit stays optional here and is resolved (or the record rejected) by
//! [`crate::normalize`].

use chrono::{DateTime, Utc};

use pulse_core::{HumorKind, NewsCategory};

/// Canonical shape a source's records are normalized into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    News(NewsCategory),
    Humor(HumorKind),
}

/// Who published a record and where it belongs on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProfile {
    /// Display name of the source
    pub name: String,
    /// ISO country code of the source
    pub country: String,
    pub destination: Destination,
}

impl SourceProfile {
    pub fn news(name: &str, country: &str, category: NewsCategory) -> Self {
        Self {
            name: name.to_string(),
            country: country.to_string(),
            destination: Destination::News(category),
        }
    }

    pub fn humor(name: &str, kind: HumorKind) -> Self {
        Self {
            name: name.to_string(),
            country: "US".to_string(),
            destination: Destination::Humor(kind),
        }
    }
}

/// A provider timestamp before resolution
#[derive(Debug, Clone, PartialEq)]
pub enum RawTime {
    /// Textual date in a provider format (RFC 2822, RFC 3339, ...)
    Text(String),
    /// Seconds since the unix epoch
    Unix(i64),
    /// Already typed by the parsing library
    Parsed(DateTime<Utc>),
    Missing,
}

impl From<Option<&str>> for RawTime {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(text) if !text.trim().is_empty() => RawTime::Text(text.trim().to_string()),
            _ => RawTime::Missing,
        }
    }
}

/// Entry of an RSS or Atom feed
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub profile: SourceProfile,
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: RawTime,
    /// Description or summary, possibly HTML
    pub summary_html: Option<String>,
    /// Image resolved from enclosures or media extensions
    pub image_url: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// Post from a link aggregator or social link API
#[derive(Debug, Clone)]
pub struct LinkPost {
    pub profile: SourceProfile,
    /// Provider-side identifier
    pub external_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub media_url: Option<String>,
    pub score: Option<i64>,
    pub created: RawTime,
    pub collected_at: DateTime<Utc>,
}

/// Entry of the regulatory filings feed
#[derive(Debug, Clone)]
pub struct FilingEntry {
    /// Form type, e.g. "8-K"
    pub form: String,
    /// Feed title, e.g. "8-K - Example Corp (0000000000) (Filer)"
    pub title: Option<String>,
    pub link: Option<String>,
    pub updated: RawTime,
    pub summary_html: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// Quote payload from a price provider
#[derive(Debug, Clone)]
pub struct RawQuote {
    pub symbol: String,
    pub name: Option<String>,
    pub name_localized: Option<String>,
    pub price: Option<f64>,
    /// Absolute 24h change, when the provider reports it
    pub change: Option<f64>,
    /// Relative 24h change, when the provider reports it
    pub change_percent: Option<f64>,
    pub updated: RawTime,
    pub collected_at: DateTime<Utc>,
}

/// Sentiment index payload
#[derive(Debug, Clone)]
pub struct RawSentiment {
    pub value: Option<String>,
    pub classification: Option<String>,
    pub updated: RawTime,
}

/// Comic strip payload
#[derive(Debug, Clone)]
pub struct ComicStrip {
    pub source: String,
    pub number: Option<u64>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// Animated gif payload
#[derive(Debug, Clone)]
pub struct GifEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub published: RawTime,
    pub collected_at: DateTime<Utc>,
}

/// Any record a collector can produce
#[derive(Debug, Clone)]
pub enum RawRecord {
    Feed(FeedEntry),
    Link(LinkPost),
    Filing(FilingEntry),
    Quote(RawQuote),
    Sentiment(RawSentiment),
    Comic(ComicStrip),
    Gif(GifEntry),
}
