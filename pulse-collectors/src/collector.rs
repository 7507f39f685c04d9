//! Collector contract and the failure-isolating collector set

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::CollectError;
use crate::record::RawRecord;

/// One external source
#[async_trait]
pub trait Collector: Send + Sync {
    /// Stable name used for routing and logging
    fn name(&self) -> &'static str;

    /// Fetch the current batch of raw records from the provider
    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError>;
}

/// A named group of collectors run concurrently, each under its own timeout
#[derive(Clone)]
pub struct CollectorSet {
    collectors: Vec<Arc<dyn Collector>>,
    timeout: Duration,
}

impl CollectorSet {
    pub fn new(timeout: Duration) -> Self {
        Self {
            collectors: Vec::new(),
            timeout,
        }
    }

    pub fn with(mut self, collector: impl Collector + 'static) -> Self {
        self.collectors.push(Arc::new(collector));
        self
    }

    pub fn push(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.push(collector);
    }

    /// Names of all registered collectors, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collectors.iter().any(|c| c.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Restrict to the named collectors
    pub fn subset(&self, names: &[&str]) -> CollectorSet {
        CollectorSet {
            collectors: self
                .collectors
                .iter()
                .filter(|c| names.contains(&c.name()))
                .cloned()
                .collect(),
            timeout: self.timeout,
        }
    }

    /// Run every collector concurrently. A failing or slow collector
    /// contributes an empty batch and never affects the others.
    pub async fn collect_all(&self) -> Vec<RawRecord> {
        let runs = self.collectors.iter().map(|c| self.run(c.as_ref()));
        let batches = join_all(runs).await;

        let records: Vec<RawRecord> = batches.into_iter().flatten().collect();
        info!(
            "[COLLECT] {} collectors produced {} raw records",
            self.collectors.len(),
            records.len()
        );
        records
    }

    /// Run a single collector by name; `None` when no such collector exists
    pub async fn collect_one(&self, name: &str) -> Option<Vec<RawRecord>> {
        let collector = self.collectors.iter().find(|c| c.name() == name)?;
        Some(self.run(collector.as_ref()).await)
    }

    async fn run(&self, collector: &dyn Collector) -> Vec<RawRecord> {
        let name = collector.name();
        let result = match tokio::time::timeout(self.timeout, collector.collect()).await {
            Ok(result) => result,
            Err(_) => Err(CollectError::TimedOut(self.timeout)),
        };

        match result {
            Ok(records) => {
                debug!("[COLLECT:{}] {} records", name, records.len());
                records
            }
            Err(CollectError::MissingCredentials(key)) => {
                debug!("[COLLECT:{}] skipped, {} not configured", name, key);
                Vec::new()
            }
            Err(e @ CollectError::RateLimited) | Err(e @ CollectError::TimedOut(_)) => {
                warn!("[COLLECT:{}] {}", name, e);
                Vec::new()
            }
            Err(e) => {
                warn!("[COLLECT:{}] failed: {}", name, e);
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for CollectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorSet")
            .field("collectors", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawSentiment, RawTime};

    struct Fixed(&'static str, usize);

    #[async_trait]
    impl Collector for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
            Ok((0..self.1)
                .map(|i| {
                    RawRecord::Sentiment(RawSentiment {
                        value: Some(i.to_string()),
                        classification: None,
                        updated: RawTime::Missing,
                    })
                })
                .collect())
        }
    }

    struct Failing;

    #[async_trait]
    impl Collector for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
            Err(CollectError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    struct Hanging;

    #[async_trait]
    impl Collector for Hanging {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_isolated() {
        let set = CollectorSet::new(Duration::from_secs(8))
            .with(Fixed("a", 2))
            .with(Failing)
            .with(Hanging)
            .with(Fixed("b", 3));

        let records = set.collect_all().await;
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn test_collect_one() {
        let set = CollectorSet::new(Duration::from_secs(8))
            .with(Fixed("a", 2))
            .with(Failing);

        assert_eq!(set.collect_one("a").await.map(|r| r.len()), Some(2));
        assert_eq!(set.collect_one("failing").await.map(|r| r.len()), Some(0));
        assert!(set.collect_one("missing").await.is_none());
    }

    #[test]
    fn test_subset_keeps_order() {
        let set = CollectorSet::new(Duration::from_secs(8))
            .with(Fixed("a", 0))
            .with(Fixed("b", 0))
            .with(Fixed("c", 0));

        assert_eq!(set.subset(&["c", "a"]).names(), vec!["a", "c"]);
        assert!(set.contains("b"));
    }
}
