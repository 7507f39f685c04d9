//! Giphy trending gif collector

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{GifEntry, RawRecord};

const GIPHY_BASE: &str = "https://api.giphy.com/v1";

const TRENDING_LIMIT: &str = "25";

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    data: Vec<Gif>,
}

#[derive(Debug, Deserialize)]
struct Gif {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    /// "YYYY-MM-DD HH:MM:SS", or "0000-00-00 00:00:00" when unknown
    #[serde(default)]
    import_datetime: Option<String>,
    #[serde(default)]
    trending_datetime: Option<String>,
    #[serde(default)]
    images: Option<GifImages>,
}

#[derive(Debug, Deserialize)]
struct GifImages {
    #[serde(default)]
    downsized: Option<GifRendition>,
    #[serde(default)]
    original: Option<GifRendition>,
}

#[derive(Debug, Deserialize)]
struct GifRendition {
    #[serde(default)]
    url: Option<String>,
}

/// Trending gifs; requires an API key
pub struct GiphyCollector {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GiphyCollector {
    pub fn new(user_agent: &str, api_key: Option<String>) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: GIPHY_BASE.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Collector for GiphyCollector {
    fn name(&self) -> &'static str {
        "giphy"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CollectError::MissingCredentials("GIPHY_API_KEY"))?;

        let request = self
            .client
            .get(format!("{}/gifs/trending", self.base_url))
            .query(&[
                ("api_key", api_key),
                ("limit", TRENDING_LIMIT),
                ("rating", "pg"),
            ]);
        let response: TrendingResponse = fetch_json(request).await?;
        let collected_at = Utc::now();

        let records: Vec<RawRecord> = response
            .data
            .into_iter()
            .map(|gif| {
                let image_url = gif.images.and_then(|images| {
                    images
                        .downsized
                        .and_then(|r| r.url)
                        .or_else(|| images.original.and_then(|r| r.url))
                });
                let published = gif
                    .trending_datetime
                    .filter(|d| !d.starts_with("0000"))
                    .or(gif.import_datetime.filter(|d| !d.starts_with("0000")));

                RawRecord::Gif(GifEntry {
                    id: gif.id,
                    title: gif.title,
                    image_url,
                    published: published.as_deref().into(),
                    collected_at,
                })
            })
            .collect();

        info!("[GIPHY] Fetched {} gifs", records.len());
        Ok(records)
    }
}
