//! Normalizer
//!
//! Maps raw provider records into the canonical item shapes. Normalization is
//! pure: it performs no I/O and never reads the clock. Records missing a
//! title, a resolvable timestamp, or (for humor) a media reference are
//! rejected by returning `None`; numeric fields fall back to zero.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use pulse_core::{FearGreedReading, HumorItem, MarketQuote, NewsCategory, NewsItem};

use crate::record::{
    ComicStrip, Destination, FeedEntry, FilingEntry, GifEntry, LinkPost, RawQuote, RawRecord,
    RawSentiment, RawTime,
};

/// Longest summary kept on a news item, in characters
const SUMMARY_MAX_CHARS: usize = 280;

/// A record after normalization
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedItem {
    News(NewsItem),
    Humor(HumorItem),
    Quote(MarketQuote),
    Sentiment(FearGreedReading),
}

/// Normalized records of one collection cycle, grouped by shape
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub news: Vec<NewsItem>,
    pub humor: Vec<HumorItem>,
    pub quotes: Vec<MarketQuote>,
    /// Most recent sentiment reading
    pub sentiment: Option<FearGreedReading>,
    /// Number of records dropped by the normalizer
    pub rejected: usize,
}

/// Normalize a single raw record
pub fn normalize(record: RawRecord) -> Option<NormalizedItem> {
    match record {
        RawRecord::Feed(entry) => normalize_feed_entry(entry),
        RawRecord::Link(post) => normalize_link_post(post),
        RawRecord::Filing(entry) => normalize_filing(entry).map(NormalizedItem::News),
        RawRecord::Quote(quote) => normalize_quote(quote).map(NormalizedItem::Quote),
        RawRecord::Sentiment(reading) => normalize_sentiment(reading).map(NormalizedItem::Sentiment),
        RawRecord::Comic(strip) => normalize_comic(strip).map(NormalizedItem::Humor),
        RawRecord::Gif(gif) => normalize_gif(gif).map(NormalizedItem::Humor),
    }
}

/// Normalize a whole batch, dropping rejected records and duplicate ids
pub fn normalize_all(records: Vec<RawRecord>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen_news = HashSet::new();
    let mut seen_humor = HashSet::new();

    for record in records {
        match normalize(record) {
            Some(NormalizedItem::News(item)) => {
                if seen_news.insert(item.id.clone()) {
                    batch.news.push(item);
                }
            }
            Some(NormalizedItem::Humor(item)) => {
                if seen_humor.insert(item.id.clone()) {
                    batch.humor.push(item);
                }
            }
            Some(NormalizedItem::Quote(quote)) => batch.quotes.push(quote),
            Some(NormalizedItem::Sentiment(reading)) => {
                let newer = batch
                    .sentiment
                    .as_ref()
                    .map_or(true, |current| reading.updated_at > current.updated_at);
                if newer {
                    batch.sentiment = Some(reading);
                }
            }
            None => batch.rejected += 1,
        }
    }

    batch
}

fn normalize_feed_entry(entry: FeedEntry) -> Option<NormalizedItem> {
    let title = clean_text(entry.title.as_deref()?)?;
    let link = http_url(entry.link.as_deref())?;
    let published_at = resolve_time(&entry.published).or_else(|| extract_date_from_url(&link))?;
    let profile = entry.profile;

    match profile.destination {
        Destination::News(category) => {
            let summary = entry
                .summary_html
                .as_deref()
                .and_then(clean_text)
                .map(|s| truncate_chars(&s, SUMMARY_MAX_CHARS));
            let tickers = extract_cashtags(&title);

            Some(NormalizedItem::News(NewsItem {
                id: stable_id(&profile.name, &link),
                title,
                title_translated: None,
                source: profile.name,
                country: profile.country.to_uppercase(),
                category,
                published_at,
                score: 0,
                url: link,
                summary,
                tickers,
            }))
        }
        Destination::Humor(kind) => {
            let media_url = http_url(entry.image_url.as_deref()).or_else(|| {
                entry
                    .summary_html
                    .as_deref()
                    .and_then(extract_image_from_html)
            })?;

            Some(NormalizedItem::Humor(HumorItem {
                id: stable_id(&profile.name, &link),
                title,
                kind,
                media_url,
                source: profile.name,
                upvotes: 0,
                published_at,
                collected_at: entry.collected_at,
            }))
        }
    }
}

fn normalize_link_post(post: LinkPost) -> Option<NormalizedItem> {
    let title = clean_text(post.title.as_deref()?)?;
    let published_at = resolve_time(&post.created)?;
    let score = coerce_count(post.score);
    let profile = post.profile;

    match profile.destination {
        Destination::News(category) => {
            let url = http_url(post.url.as_deref())?;
            let tickers = extract_cashtags(&title);

            Some(NormalizedItem::News(NewsItem {
                id: stable_id(&profile.name, &post.external_id),
                title,
                title_translated: None,
                source: profile.name,
                country: profile.country.to_uppercase(),
                category,
                published_at,
                score,
                url,
                summary: None,
                tickers,
            }))
        }
        Destination::Humor(kind) => {
            let media_url = http_url(post.media_url.as_deref())?;

            Some(NormalizedItem::Humor(HumorItem {
                id: stable_id(&profile.name, &post.external_id),
                title,
                kind,
                media_url,
                source: profile.name,
                upvotes: score,
                published_at,
                collected_at: post.collected_at,
            }))
        }
    }
}

fn normalize_filing(entry: FilingEntry) -> Option<NewsItem> {
    let raw_title = clean_text(entry.title.as_deref()?)?;
    let link = http_url(entry.link.as_deref())?;
    let published_at = resolve_time(&entry.updated)?;
    let company = filing_company(&raw_title).unwrap_or_else(|| raw_title.clone());
    let source = "SEC EDGAR";

    Some(NewsItem {
        id: stable_id(source, &link),
        title: format!("{} files Form {}", company, entry.form),
        title_translated: None,
        source: source.to_string(),
        country: "US".to_string(),
        category: NewsCategory::Economy,
        published_at,
        score: 0,
        url: link,
        summary: entry
            .summary_html
            .as_deref()
            .and_then(clean_text)
            .map(|s| truncate_chars(&s, SUMMARY_MAX_CHARS)),
        tickers: Vec::new(),
    })
}

/// Rejects quotes whose deltas overflow decimal arithmetic
fn normalize_quote(quote: RawQuote) -> Option<MarketQuote> {
    let price = coerce_decimal(quote.price);
    let updated_at = resolve_time(&quote.updated).unwrap_or(quote.collected_at);
    let name = quote
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| quote.symbol.clone());

    let normalized = match (quote.change, quote.change_percent) {
        (Some(change), _) => {
            MarketQuote::from_change(&quote.symbol, name, price, coerce_decimal(Some(change)), updated_at)
        }
        (None, Some(percent)) => {
            MarketQuote::from_percent(&quote.symbol, name, price, coerce_decimal(Some(percent)), updated_at)
        }
        (None, None) => MarketQuote::from_change(&quote.symbol, name, price, Decimal::ZERO, updated_at),
    }?;

    Some(match quote.name_localized {
        Some(localized) => normalized.with_localized_name(localized),
        None => normalized,
    })
}

fn normalize_sentiment(reading: RawSentiment) -> Option<FearGreedReading> {
    let updated_at = resolve_time(&reading.updated)?;
    let value = reading
        .value
        .as_deref()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0);
    let classification = reading
        .classification
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| classify_fear_greed(value).to_string());

    Some(FearGreedReading::new(value, classification, updated_at))
}

fn normalize_comic(strip: ComicStrip) -> Option<HumorItem> {
    let title = clean_text(strip.title.as_deref()?)?;
    let media_url = http_url(strip.image_url.as_deref())?;
    let published_at = comic_date(&strip)?;
    let key = strip
        .number
        .map(|n| n.to_string())
        .unwrap_or_else(|| media_url.clone());

    Some(HumorItem {
        id: stable_id(&strip.source, &key),
        title,
        kind: pulse_core::HumorKind::Comic,
        media_url,
        source: strip.source,
        upvotes: 0,
        published_at,
        collected_at: strip.collected_at,
    })
}

fn normalize_gif(gif: GifEntry) -> Option<HumorItem> {
    let title = clean_text(gif.title.as_deref()?)?;
    let media_url = http_url(gif.image_url.as_deref())?;
    let published_at = resolve_time(&gif.published)?;
    let source = "Giphy";
    let key = gif.id.unwrap_or_else(|| media_url.clone());

    Some(HumorItem {
        id: stable_id(source, &key),
        title,
        kind: pulse_core::HumorKind::Gif,
        media_url,
        source: source.to_string(),
        upvotes: 0,
        published_at,
        collected_at: gif.collected_at,
    })
}

/// Stable, source-scoped identifier: first 8 bytes of SHA-256 over `source|key`
pub fn stable_id(source: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(key.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Resolve a provider timestamp
pub(crate) fn resolve_time(raw: &RawTime) -> Option<DateTime<Utc>> {
    match raw {
        RawTime::Parsed(dt) => Some(*dt),
        RawTime::Unix(secs) if *secs > 0 => DateTime::from_timestamp(*secs, 0),
        RawTime::Unix(_) => None,
        RawTime::Text(text) => parse_text_time(text),
        RawTime::Missing => None,
    }
}

fn parse_text_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            text.parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
        })
}

fn comic_date(strip: &ComicStrip) -> Option<DateTime<Utc>> {
    let year: i32 = strip.year.as_deref()?.trim().parse().ok()?;
    let month: u32 = strip.month.as_deref()?.trim().parse().ok()?;
    let day: u32 = strip.day.as_deref()?.trim().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_hms_opt(12, 0, 0)?.and_utc())
}

/// Extract date from URL patterns
pub(crate) fn extract_date_from_url(url: &str) -> Option<DateTime<Utc>> {
    // Pattern: /2025/12/09/ or /2025/12/9/
    let slash_pattern = regex::Regex::new(r"/(\d{4})/(\d{1,2})/(\d{1,2})/").ok()?;
    // Pattern: /2025-12-09/ or -2025-12-09-
    let dash_pattern = regex::Regex::new(r"[/-](\d{4})-(\d{2})-(\d{2})[/-]").ok()?;

    let caps = slash_pattern
        .captures(url)
        .or_else(|| dash_pattern.captures(url))?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_hms_opt(12, 0, 0)?.and_utc())
}

/// Extract image URL from HTML content (finds first <img src="...">)
pub(crate) fn extract_image_from_html(html: &str) -> Option<String> {
    let img_pattern = regex::Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).ok()?;
    let url = img_pattern.captures(html)?.get(1)?.as_str().to_string();
    // Skip tiny tracking pixels and icons
    if url.contains("1x1") || url.contains("pixel") || url.contains("spacer") {
        return None;
    }
    http_url(Some(&url))
}

/// Strip HTML tags from text
pub(crate) fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    decode_entities(&result)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Strip markup and whitespace; empty text counts as absent
fn clean_text(raw: &str) -> Option<String> {
    let text = strip_html(raw);
    (!text.is_empty()).then_some(text)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Accept only absolute http(s) URLs
fn http_url(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let parsed = url::Url::parse(raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| raw.to_string())
}

fn coerce_count(raw: Option<i64>) -> u64 {
    raw.map(|v| v.max(0) as u64).unwrap_or(0)
}

fn coerce_decimal(raw: Option<f64>) -> Decimal {
    raw.filter(|v| v.is_finite())
        .and_then(Decimal::from_f64)
        .map(|d| d.normalize())
        .unwrap_or(Decimal::ZERO)
}

/// Ticker symbols written as cashtags (`$AAPL`)
fn extract_cashtags(text: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for token in text.split_whitespace() {
        let Some(rest) = token.strip_prefix('$') else {
            continue;
        };
        let symbol: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '.')
            .collect::<String>()
            .trim_end_matches('.')
            .to_uppercase();
        let valid = !symbol.is_empty()
            && symbol.len() <= 10
            && symbol.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if valid && !tickers.contains(&symbol) {
            tickers.push(symbol);
        }
    }
    tickers
}

/// Company name from an EDGAR title such as "8-K - Example Corp (0000000000) (Filer)"
fn filing_company(title: &str) -> Option<String> {
    let (_, rest) = title.split_once(" - ")?;
    let company = rest.split(" (").next()?.trim();
    (!company.is_empty()).then(|| company.to_string())
}

fn classify_fear_greed(value: u64) -> &'static str {
    match value {
        0..=24 => "Extreme Fear",
        25..=44 => "Fear",
        45..=55 => "Neutral",
        56..=75 => "Greed",
        _ => "Extreme Greed",
    }
}
