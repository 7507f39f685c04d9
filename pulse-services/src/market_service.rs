//! Market Service
//!
//! Quotes and sentiment, each cached under its own key and TTL so fast-moving
//! crypto prices refresh more often than forex fixings.

use std::time::Duration;

use chrono::Utc;
use futures::join;
use tracing::{debug, info, instrument, warn};

use pulse_collectors::{normalize_all, CollectorSet, NormalizedBatch};
use pulse_core::{FearGreedReading, MarketQuote, MarketSnapshot, PulseError};

use crate::cache::{keys, ttl, CacheLayer};
use crate::capabilities::Capabilities;
use crate::fallback;

/// A market resource: the collector that produces it and how it is cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketResource {
    Crypto,
    Indices,
    Forex,
    FearGreed,
}

impl MarketResource {
    pub const ALL: [MarketResource; 4] = [
        MarketResource::Crypto,
        MarketResource::Indices,
        MarketResource::Forex,
        MarketResource::FearGreed,
    ];

    pub fn collector(&self) -> &'static str {
        match self {
            MarketResource::Crypto => "crypto",
            MarketResource::Indices => "indices",
            MarketResource::Forex => "forex",
            MarketResource::FearGreed => "fear-greed",
        }
    }

    pub fn cache_key(&self) -> &'static str {
        match self {
            MarketResource::Crypto => keys::CRYPTO,
            MarketResource::Indices => keys::INDICES,
            MarketResource::Forex => keys::FOREX,
            MarketResource::FearGreed => keys::FEAR_GREED,
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            MarketResource::Crypto => ttl::CRYPTO,
            MarketResource::Indices => ttl::INDICES,
            MarketResource::Forex => ttl::FOREX,
            MarketResource::FearGreed => ttl::FEAR_GREED,
        }
    }

    pub fn from_collector(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.collector() == name)
    }
}

/// Market snapshot assembly
pub struct MarketService {
    caps: Capabilities,
    cache: CacheLayer,
    collectors: CollectorSet,
}

impl MarketService {
    pub fn new(caps: Capabilities, cache: CacheLayer, collectors: CollectorSet) -> Self {
        info!(
            "Initializing MarketService (live: {}, collectors: {:?})",
            caps.is_live(),
            collectors.names()
        );
        Self {
            caps,
            cache,
            collectors,
        }
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.names()
    }

    async fn fetch(&self, resource: MarketResource) -> NormalizedBatch {
        let records = self
            .collectors
            .collect_one(resource.collector())
            .await
            .unwrap_or_default();
        normalize_all(records)
    }

    /// Cached quotes for a resource. An empty result is not cached.
    async fn quotes(&self, resource: MarketResource) -> Vec<MarketQuote> {
        let result = self
            .cache
            .try_get_or_compute(resource.cache_key(), resource.ttl(), || async {
                let quotes = self.fetch(resource).await.quotes;
                if quotes.is_empty() {
                    Err(PulseError::provider(resource.collector(), "no quotes"))
                } else {
                    Ok(quotes)
                }
            })
            .await;

        result.unwrap_or_else(|e| {
            warn!("[MARKET] {}", e);
            Vec::new()
        })
    }

    #[instrument(skip(self))]
    pub async fn crypto(&self) -> Vec<MarketQuote> {
        if self.caps.is_demo() {
            return fallback::crypto();
        }
        self.quotes(MarketResource::Crypto).await
    }

    #[instrument(skip(self))]
    pub async fn indices(&self) -> Vec<MarketQuote> {
        if self.caps.is_demo() {
            return fallback::indices();
        }
        self.quotes(MarketResource::Indices).await
    }

    #[instrument(skip(self))]
    pub async fn forex(&self) -> Vec<MarketQuote> {
        if self.caps.is_demo() {
            return fallback::forex();
        }
        self.quotes(MarketResource::Forex).await
    }

    #[instrument(skip(self))]
    pub async fn fear_greed(&self) -> Option<FearGreedReading> {
        if self.caps.is_demo() {
            return Some(fallback::fear_greed());
        }

        let resource = MarketResource::FearGreed;
        self.cache
            .try_get_or_compute(resource.cache_key(), resource.ttl(), || async {
                self.fetch(resource)
                    .await
                    .sentiment
                    .ok_or_else(|| PulseError::provider(resource.collector(), "no reading"))
            })
            .await
            .map_err(|e| warn!("[MARKET] {}", e))
            .ok()
    }

    /// All market resources in one payload
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> MarketSnapshot {
        if self.caps.is_demo() {
            return fallback::market_snapshot();
        }

        let (indices, crypto, forex, fear_greed) =
            join!(self.indices(), self.crypto(), self.forex(), self.fear_greed());

        let updated_at = indices
            .iter()
            .chain(&crypto)
            .chain(&forex)
            .map(|q| q.updated_at)
            .chain(fear_greed.as_ref().map(|f| f.updated_at))
            .max()
            .unwrap_or_else(Utc::now);

        MarketSnapshot {
            indices,
            crypto,
            forex,
            fear_greed,
            updated_at,
        }
    }

    /// Run one named collector now and replace its cache entry. `None` when
    /// the collector does not feed market data.
    #[instrument(skip(self))]
    pub async fn collect_from(&self, name: &str) -> Option<usize> {
        let resource = MarketResource::from_collector(name)?;
        if !self.collectors.contains(name) {
            return None;
        }

        let batch = self.fetch(resource).await;
        let collected = match resource {
            MarketResource::FearGreed => match &batch.sentiment {
                Some(reading) => {
                    self.cache.set(resource.cache_key(), reading, resource.ttl()).await;
                    1
                }
                None => 0,
            },
            _ => {
                if !batch.quotes.is_empty() {
                    self.cache
                        .set(resource.cache_key(), &batch.quotes, resource.ttl())
                        .await;
                }
                batch.quotes.len()
            }
        };

        debug!("[MARKET] {} collected {}", name, collected);
        Some(collected)
    }
}
