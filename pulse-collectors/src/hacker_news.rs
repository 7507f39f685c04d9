//! Hacker News collector (Firebase API)

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use pulse_core::NewsCategory;

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{LinkPost, RawRecord, RawTime, SourceProfile};

const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
const HN_ITEM_PAGE: &str = "https://news.ycombinator.com/item?id=";

/// Stories fetched per cycle
const TOP_N: usize = 30;
/// Concurrent item requests
const ITEM_CONCURRENCY: usize = 8;

#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    dead: bool,
    #[serde(default)]
    deleted: bool,
}

/// Top stories from Hacker News
pub struct HackerNewsCollector {
    client: Client,
    base_url: String,
    limit: usize,
}

impl HackerNewsCollector {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: HN_API_BASE.to_string(),
            limit: TOP_N,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    async fn fetch_item(&self, id: u64) -> Result<Option<HnItem>, CollectError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        fetch_json(self.client.get(url)).await
    }
}

#[async_trait]
impl Collector for HackerNewsCollector {
    fn name(&self) -> &'static str {
        "hackernews"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let ids: Vec<u64> =
            fetch_json(self.client.get(format!("{}/topstories.json", self.base_url))).await?;
        let collected_at = Utc::now();
        let profile = SourceProfile::news("Hacker News", "US", NewsCategory::Tech);

        let items: Vec<HnItem> = stream::iter(ids.into_iter().take(self.limit))
            .map(|id| self.fetch_item(id))
            .buffered(ITEM_CONCURRENCY)
            .filter_map(|result| async move {
                match result {
                    Ok(item) => item,
                    Err(e) => {
                        debug!("[HN] Skipping item: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        let records: Vec<RawRecord> = items
            .into_iter()
            .filter(|item| !item.dead && !item.deleted)
            .map(|item| {
                let external_id = item.id.to_string();
                // Ask HN and job posts have no outbound link
                let url = item
                    .url
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| format!("{}{}", HN_ITEM_PAGE, item.id));

                RawRecord::Link(LinkPost {
                    profile: profile.clone(),
                    external_id,
                    title: item.title,
                    url: Some(url),
                    media_url: None,
                    score: item.score,
                    created: item.time.map(RawTime::Unix).unwrap_or(RawTime::Missing),
                    collected_at,
                })
            })
            .collect();

        info!("[HN] Fetched {} stories", records.len());
        Ok(records)
    }
}
