//! Frankfurter (ECB reference rates) forex collector
//!
//! Requests a short time series so the daily change can be derived from the
//! last two published fixings.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{RawQuote, RawRecord, RawTime};

const FRANKFURTER_BASE: &str = "https://api.frankfurter.app";

/// Quote currencies against USD: (code, name, Korean display name)
const PAIRS: &[(&str, &str, &str)] = &[
    ("KRW", "US Dollar / Korean Won", "달러/원"),
    ("JPY", "US Dollar / Japanese Yen", "달러/엔"),
    ("EUR", "US Dollar / Euro", "달러/유로"),
    ("CNY", "US Dollar / Chinese Yuan", "달러/위안"),
];

/// Calendar days requested so weekends and holidays still leave two fixings
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct TimeSeries {
    /// date -> currency -> rate
    #[serde(default)]
    rates: BTreeMap<String, BTreeMap<String, f64>>,
}

/// USD exchange rates against the tracked currencies
pub struct ForexCollector {
    client: Client,
    base_url: String,
}

impl ForexCollector {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: FRANKFURTER_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Collector for ForexCollector {
    fn name(&self) -> &'static str {
        "forex"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let collected_at = Utc::now();
        let start = (collected_at - Duration::days(LOOKBACK_DAYS)).format("%Y-%m-%d");
        let symbols = PAIRS.iter().map(|(code, _, _)| *code).collect::<Vec<_>>().join(",");

        let request = self
            .client
            .get(format!("{}/{}..", self.base_url, start))
            .query(&[("from", "USD"), ("to", symbols.as_str())]);
        let series: TimeSeries = fetch_json(request).await?;

        // BTreeMap keys are ISO dates, so iteration order is chronological
        let mut fixings = series.rates.iter().rev();
        let (latest_date, latest) = fixings
            .next()
            .ok_or_else(|| CollectError::ParseError("empty forex series".to_string()))?;
        let previous = fixings.next().map(|(_, rates)| rates);

        let records: Vec<RawRecord> = PAIRS
            .iter()
            .filter_map(|(code, name, localized)| {
                let price = *latest.get(*code)?;
                let change = previous
                    .and_then(|rates| rates.get(*code))
                    .map(|prev| price - prev);

                Some(RawRecord::Quote(RawQuote {
                    symbol: format!("USD/{code}"),
                    name: Some(name.to_string()),
                    name_localized: Some(localized.to_string()),
                    price: Some(price),
                    change,
                    change_percent: None,
                    updated: RawTime::Text(latest_date.clone()),
                    collected_at,
                }))
            })
            .collect();

        info!("[FOREX] Fetched {} rates for {}", records.len(), latest_date);
        Ok(records)
    }
}
