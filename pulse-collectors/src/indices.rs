//! Yahoo Finance chart collector for stock indices

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{RawQuote, RawRecord, RawTime};

const YAHOO_BASE: &str = "https://query1.finance.yahoo.com";

/// Tracked indices: (symbol, name, Korean display name)
const INDICES: &[(&str, &str, &str)] = &[
    ("^GSPC", "S&P 500", "S&P 500"),
    ("^IXIC", "NASDAQ Composite", "나스닥"),
    ("^DJI", "Dow Jones", "다우존스"),
    ("^KS11", "KOSPI", "코스피"),
    ("^N225", "Nikkei 225", "닛케이 225"),
];

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    regular_market_time: Option<i64>,
}

/// Last price and daily change of the tracked indices
pub struct IndicesCollector {
    client: Client,
    base_url: String,
}

impl IndicesCollector {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: YAHOO_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_index(
        &self,
        symbol: &str,
        name: &str,
        localized: &str,
    ) -> Result<RawRecord, CollectError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response: ChartResponse = fetch_json(
            self.client
                .get(url)
                .query(&[("interval", "1d"), ("range", "5d")]),
        )
        .await?;

        let meta = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|r| r.meta)
            .ok_or_else(|| CollectError::ParseError(format!("empty chart for {symbol}")))?;

        let previous = meta.chart_previous_close.or(meta.previous_close);
        let change = match (meta.regular_market_price, previous) {
            (Some(price), Some(prev)) => Some(price - prev),
            _ => None,
        };

        Ok(RawRecord::Quote(RawQuote {
            symbol: symbol.to_string(),
            name: Some(name.to_string()),
            name_localized: Some(localized.to_string()),
            price: meta.regular_market_price,
            change,
            change_percent: None,
            updated: meta
                .regular_market_time
                .map(RawTime::Unix)
                .unwrap_or(RawTime::Missing),
            collected_at: Utc::now(),
        }))
    }
}

#[async_trait]
impl Collector for IndicesCollector {
    fn name(&self) -> &'static str {
        "indices"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let results = join_all(
            INDICES
                .iter()
                .map(|(symbol, name, localized)| self.fetch_index(symbol, name, localized)),
        )
        .await;

        let mut records = Vec::new();
        let mut last_error = None;
        for ((symbol, _, _), result) in INDICES.iter().zip(results) {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("[YAHOO] {} failed: {}", symbol, e);
                    last_error = Some(e);
                }
            }
        }

        if records.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!("[YAHOO] Fetched {} index quotes", records.len());
        Ok(records)
    }
}
