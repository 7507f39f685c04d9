//! Crypto Fear & Greed index collector (alternative.me)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{RawRecord, RawSentiment};

const ALTERNATIVE_BASE: &str = "https://api.alternative.me";

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    value_classification: Option<String>,
    /// Unix seconds, as a string
    #[serde(default)]
    timestamp: Option<String>,
}

/// Latest fear & greed reading
pub struct FearGreedCollector {
    client: Client,
    base_url: String,
}

impl FearGreedCollector {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: ALTERNATIVE_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Collector for FearGreedCollector {
    fn name(&self) -> &'static str {
        "fear-greed"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let request = self
            .client
            .get(format!("{}/fng/", self.base_url))
            .query(&[("limit", "1")]);
        let response: FngResponse = fetch_json(request).await?;

        let records: Vec<RawRecord> = response
            .data
            .into_iter()
            .take(1)
            .map(|entry| {
                RawRecord::Sentiment(RawSentiment {
                    value: entry.value,
                    classification: entry.value_classification,
                    updated: entry.timestamp.as_deref().into(),
                })
            })
            .collect();

        info!("[FEAR_GREED] Fetched {} readings", records.len());
        Ok(records)
    }
}
