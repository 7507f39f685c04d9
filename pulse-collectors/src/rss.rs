//! RSS/Atom feed collector
//!
//! Fetches curated feeds concurrently and hands every entry to the normalizer
//! untouched. Used for the news feed pool and for the satire humor feeds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info, warn};

use pulse_core::{HumorKind, NewsCategory};

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_bytes};
use crate::normalize::{decode_entities, extract_image_from_html};
use crate::record::{FeedEntry, RawRecord, RawTime, SourceProfile};

/// Entries kept per feed
const PER_FEED_LIMIT: usize = 25;

/// RSS feed definition
#[derive(Debug, Clone)]
pub struct RssFeed {
    pub profile: SourceProfile,
    /// RSS feed URL
    pub url: String,
}

impl RssFeed {
    pub fn news(name: &str, url: &str, country: &str, category: NewsCategory) -> Self {
        Self {
            profile: SourceProfile::news(name, country, category),
            url: url.to_string(),
        }
    }

    pub fn humor(name: &str, url: &str, kind: HumorKind) -> Self {
        Self {
            profile: SourceProfile::humor(name, kind),
            url: url.to_string(),
        }
    }
}

/// Curated news feeds, grouped by dashboard category
pub fn curated_news_feeds() -> Vec<RssFeed> {
    use NewsCategory::*;

    vec![
        // International
        RssFeed::news("BBC World", "https://feeds.bbci.co.uk/news/world/rss.xml", "GB", International),
        RssFeed::news("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml", "QA", International),
        RssFeed::news("Guardian World", "https://www.theguardian.com/world/rss", "GB", International),
        RssFeed::news("DW News", "https://rss.dw.com/rdf/rss-en-all", "DE", International),
        RssFeed::news("NHK World", "https://www3.nhk.or.jp/rss/news/cat6.xml", "JP", International),
        // Economy
        RssFeed::news(
            "CNBC Top News",
            "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=100003114",
            "US",
            Economy,
        ),
        RssFeed::news(
            "Federal Reserve",
            "https://www.federalreserve.gov/feeds/press_all.xml",
            "US",
            Economy,
        ),
        RssFeed::news("Yonhap Economy", "https://www.yna.co.kr/rss/economy.xml", "KR", Economy),
        // Tech
        RssFeed::news(
            "MIT Technology Review",
            "https://www.technologyreview.com/feed/",
            "US",
            Tech,
        ),
        RssFeed::news("The Verge", "https://www.theverge.com/rss/index.xml", "US", Tech),
        RssFeed::news("ZDNet Korea", "https://feeds.feedburner.com/zdkorea", "KR", Tech),
        // Politics
        RssFeed::news("Politico", "https://www.politico.com/rss/politicopicks.xml", "US", Politics),
        RssFeed::news("NPR Politics", "https://feeds.npr.org/1014/rss.xml", "US", Politics),
        // Risk
        RssFeed::news("CoinDesk", "https://www.coindesk.com/arc/outboundfeeds/rss/", "US", Risk),
        RssFeed::news("ReliefWeb", "https://reliefweb.int/updates/rss.xml", "CH", Risk),
        // Culture
        RssFeed::news("NPR Arts", "https://feeds.npr.org/1008/rss.xml", "US", Culture),
        RssFeed::news("Guardian Culture", "https://www.theguardian.com/culture/rss", "GB", Culture),
    ]
}

/// Satire feeds for the humor pool
pub fn satire_feeds() -> Vec<RssFeed> {
    vec![
        RssFeed::humor("The Onion", "https://theonion.com/rss", HumorKind::Satire),
        RssFeed::humor("The Babylon Bee", "https://babylonbee.com/feed", HumorKind::Satire),
        RssFeed::humor("The Daily Mash", "https://www.thedailymash.co.uk/feed", HumorKind::Satire),
    ]
}

/// RSS feed collector
pub struct RssCollector {
    name: &'static str,
    client: Client,
    feeds: Vec<RssFeed>,
}

impl RssCollector {
    /// Collector over the curated news feeds
    pub fn news(user_agent: &str) -> Self {
        Self::with_feeds("rss", user_agent, curated_news_feeds())
    }

    /// Collector over the satire feeds
    pub fn satire(user_agent: &str) -> Self {
        Self::with_feeds("satire", user_agent, satire_feeds())
    }

    /// Create with custom feeds
    pub fn with_feeds(name: &'static str, user_agent: &str, feeds: Vec<RssFeed>) -> Self {
        Self {
            name,
            client: build_client(user_agent),
            feeds,
        }
    }

    /// Fetch a single RSS feed
    async fn fetch_feed(&self, feed: &RssFeed) -> Result<Vec<RawRecord>, CollectError> {
        let content = fetch_bytes(self.client.get(&feed.url)).await?;
        let collected_at = Utc::now();

        // Try parsing as RSS first, then Atom
        if let Ok(channel) = rss::Channel::read_from(&content[..]) {
            return Ok(parse_rss_channel(&channel, feed, collected_at));
        }

        if let Ok(atom_feed) = atom_syndication::Feed::read_from(&content[..]) {
            return Ok(parse_atom_feed(&atom_feed, feed, collected_at));
        }

        Err(CollectError::ParseError(format!(
            "Failed to parse feed: {}",
            feed.url
        )))
    }
}

#[async_trait]
impl Collector for RssCollector {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let results = join_all(self.feeds.iter().map(|feed| self.fetch_feed(feed))).await;

        let mut records = Vec::new();
        let mut last_error = None;

        for (feed, result) in self.feeds.iter().zip(results) {
            match result {
                Ok(entries) => {
                    debug!("[RSS] Fetched {} items from {}", entries.len(), feed.profile.name);
                    records.extend(entries);
                }
                Err(e) => {
                    warn!("[RSS] Failed to fetch feed {}: {}", feed.profile.name, e);
                    last_error = Some(e);
                }
            }
        }

        // Only an outage of every feed is an error
        if records.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!("[RSS:{}] Fetched {} entries from {} feeds", self.name, records.len(), self.feeds.len());
        Ok(records)
    }
}

/// Parse RSS channel into raw feed entries
fn parse_rss_channel(
    channel: &rss::Channel,
    feed: &RssFeed,
    collected_at: DateTime<Utc>,
) -> Vec<RawRecord> {
    channel
        .items()
        .iter()
        .take(PER_FEED_LIMIT)
        .map(|item| {
            let description_html = item.description().unwrap_or_default();

            // Try to get image from multiple sources:
            // 1. Enclosure with image mime type
            // 2. media:content or media:thumbnail (in extensions)
            // 3. Extract from description HTML <img> tags
            let image_url = item
                .enclosure()
                .filter(|e| e.mime_type().starts_with("image/"))
                .map(|e| e.url().to_string())
                .or_else(|| extract_media_content(item))
                .or_else(|| extract_image_from_html(description_html))
                .or_else(|| {
                    item.content()
                        .map(decode_entities)
                        .and_then(|html| extract_image_from_html(&html))
                });

            let published: RawTime = item
                .pub_date()
                .or_else(|| item.dublin_core_ext().and_then(|dc| dc.dates().first().map(String::as_str)))
                .into();

            RawRecord::Feed(FeedEntry {
                profile: feed.profile.clone(),
                title: item.title().map(str::to_string),
                link: item.link().map(str::to_string),
                published,
                summary_html: item.description().map(str::to_string),
                image_url,
                collected_at,
            })
        })
        .collect()
}

/// Parse Atom feed into raw feed entries
fn parse_atom_feed(
    atom_feed: &atom_syndication::Feed,
    feed: &RssFeed,
    collected_at: DateTime<Utc>,
) -> Vec<RawRecord> {
    atom_feed
        .entries()
        .iter()
        .take(PER_FEED_LIMIT)
        .map(|entry| {
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string());

            let published = entry
                .published()
                .map(|d| RawTime::Parsed(d.with_timezone(&Utc)))
                .unwrap_or_else(|| RawTime::Parsed(entry.updated().with_timezone(&Utc)));

            let summary_html = entry.summary().map(|s| s.as_str().to_string());
            let content_html = entry.content().and_then(|c| c.value()).unwrap_or_default();
            let image_url = extract_image_from_html(content_html).or_else(|| {
                summary_html
                    .as_deref()
                    .and_then(extract_image_from_html)
            });

            RawRecord::Feed(FeedEntry {
                profile: feed.profile.clone(),
                title: Some(entry.title().as_str().to_string()),
                link,
                published,
                summary_html,
                image_url,
                collected_at,
            })
        })
        .collect()
}

/// Extract image from RSS media:content or media:thumbnail extensions
fn extract_media_content(item: &rss::Item) -> Option<String> {
    let media = item.extensions().get("media")?;

    if let Some(content_list) = media.get("content") {
        for content in content_list {
            let Some(url) = content.attrs().get("url") else {
                continue;
            };
            let medium = content.attrs().get("medium").map(|s| s.as_str());
            let mime = content.attrs().get("type").map(|s| s.as_str());
            let looks_like_image = [".jpg", ".jpeg", ".png", ".webp", ".gif"]
                .iter()
                .any(|ext| url.to_lowercase().ends_with(ext));

            if medium == Some("image")
                || mime.is_some_and(|m| m.starts_with("image/"))
                || looks_like_image
            {
                return Some(url.clone());
            }
        }
    }

    media
        .get("thumbnail")?
        .iter()
        .find_map(|thumbnail| thumbnail.attrs().get("url").cloned())
}
