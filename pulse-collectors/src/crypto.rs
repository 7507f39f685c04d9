//! CoinGecko crypto price collector

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::record::{RawQuote, RawRecord};

const COINGECKO_BASE: &str = "https://api.coingecko.com/api/v3";

/// Tracked coins: (CoinGecko id, Korean display name)
const COINS: &[(&str, &str)] = &[
    ("bitcoin", "비트코인"),
    ("ethereum", "이더리움"),
    ("solana", "솔라나"),
    ("ripple", "리플"),
    ("dogecoin", "도지코인"),
    ("cardano", "에이다"),
];

#[derive(Debug, Deserialize)]
struct CoinMarket {
    id: String,
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    current_price: Option<f64>,
    #[serde(default)]
    price_change_24h: Option<f64>,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Spot prices of the tracked coins in USD
pub struct CryptoCollector {
    client: Client,
    base_url: String,
}

impl CryptoCollector {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: COINGECKO_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Collector for CryptoCollector {
    fn name(&self) -> &'static str {
        "crypto"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let ids = COINS.iter().map(|(id, _)| *id).collect::<Vec<_>>().join(",");
        let request = self
            .client
            .get(format!("{}/coins/markets", self.base_url))
            .query(&[
                ("vs_currency", "usd"),
                ("ids", ids.as_str()),
                ("price_change_percentage", "24h"),
            ]);

        let markets: Vec<CoinMarket> = fetch_json(request).await?;
        let collected_at = Utc::now();

        let records: Vec<RawRecord> = markets
            .into_iter()
            .map(|coin| {
                let localized = COINS
                    .iter()
                    .find(|(id, _)| *id == coin.id)
                    .map(|(_, name)| name.to_string());

                RawRecord::Quote(RawQuote {
                    symbol: coin.symbol.to_uppercase(),
                    name: coin.name,
                    name_localized: localized,
                    price: coin.current_price,
                    change: coin.price_change_24h,
                    change_percent: coin.price_change_percentage_24h,
                    updated: coin.last_updated.as_deref().into(),
                    collected_at,
                })
            })
            .collect();

        info!("[COINGECKO] Fetched {} quotes", records.len());
        Ok(records)
    }
}
