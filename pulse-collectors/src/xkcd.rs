//! xkcd comic collector

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{ComicStrip, RawRecord};

const XKCD_BASE: &str = "https://xkcd.com";

/// Latest comic plus this many predecessors
const BACK_ISSUES: u64 = 4;

#[derive(Debug, Deserialize)]
struct Comic {
    num: u64,
    #[serde(default)]
    safe_title: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    day: Option<String>,
}

impl Comic {
    fn into_record(self) -> RawRecord {
        RawRecord::Comic(ComicStrip {
            source: "xkcd".to_string(),
            number: Some(self.num),
            title: self.safe_title.or(self.title),
            image_url: self.img,
            year: self.year,
            month: self.month,
            day: self.day,
            collected_at: Utc::now(),
        })
    }
}

/// Most recent xkcd strips
pub struct XkcdCollector {
    client: Client,
    base_url: String,
}

impl XkcdCollector {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: XKCD_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_comic(&self, num: u64) -> Result<Comic, CollectError> {
        fetch_json(self.client.get(format!("{}/{}/info.0.json", self.base_url, num))).await
    }
}

#[async_trait]
impl Collector for XkcdCollector {
    fn name(&self) -> &'static str {
        "xkcd"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let latest: Comic =
            fetch_json(self.client.get(format!("{}/info.0.json", self.base_url))).await?;

        let first = latest.num.saturating_sub(BACK_ISSUES).max(1);
        let back_issues = join_all((first..latest.num).rev().map(|n| self.fetch_comic(n))).await;

        let mut records = vec![latest.into_record()];
        for result in back_issues {
            match result {
                Ok(comic) => records.push(comic.into_record()),
                Err(e) => debug!("[XKCD] Skipping back issue: {}", e),
            }
        }

        info!("[XKCD] Fetched {} comics", records.len());
        Ok(records)
    }
}
