//! Humor Service
//!
//! Memes, gifs, satire and comics, pooled and cached like the news feed.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use pulse_collectors::{normalize_all, CollectorSet};
use pulse_core::{HumorItem, HumorKind, Page, PageRequest};

use crate::cache::{keys, ttl, CacheLayer};
use crate::capabilities::Capabilities;
use crate::fallback;
use crate::store::Store;

/// Items kept in the humor pool
const POOL_SIZE: usize = 300;

pub struct HumorService {
    caps: Capabilities,
    cache: CacheLayer,
    collectors: CollectorSet,
    store: Option<Arc<dyn Store>>,
}

impl HumorService {
    pub fn new(
        caps: Capabilities,
        cache: CacheLayer,
        collectors: CollectorSet,
        store: Option<Arc<dyn Store>>,
    ) -> Self {
        info!(
            "Initializing HumorService (live: {}, collectors: {:?})",
            caps.is_live(),
            collectors.names()
        );
        Self {
            caps,
            cache,
            collectors,
            store,
        }
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.names()
    }

    pub async fn pool(&self) -> Vec<HumorItem> {
        if self.caps.is_demo() {
            return fallback::humor();
        }

        self.cache
            .get_or_compute(keys::HUMOR_POOL, ttl::HUMOR_POOL, || self.build_pool())
            .await
    }

    async fn build_pool(&self) -> Vec<HumorItem> {
        if let Some(store) = &self.store {
            match store.recent_humor(POOL_SIZE).await {
                Ok(items) if !items.is_empty() => return items,
                Ok(_) => debug!("[HUMOR] Store empty, collecting live"),
                Err(e) => warn!("[HUMOR] Store read failed, collecting live: {}", e),
            }
        }

        let mut pool = self.collect(&self.collectors).await;
        pool.sort_by(latest_first);
        pool.truncate(POOL_SIZE);
        pool
    }

    async fn collect(&self, collectors: &CollectorSet) -> Vec<HumorItem> {
        let batch = normalize_all(collectors.collect_all().await);
        info!(
            "[HUMOR] Collected {} items ({} rejected)",
            batch.humor.len(),
            batch.rejected
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.upsert_humor(&batch.humor).await {
                warn!("[HUMOR] Failed to persist collected items: {}", e);
            }
        }
        batch.humor
    }

    /// Run one named collector now. `None` when it does not feed humor.
    #[instrument(skip(self))]
    pub async fn collect_from(&self, name: &str) -> Option<usize> {
        if !self.collectors.contains(name) {
            return None;
        }

        let collected = self.collect(&self.collectors.subset(&[name])).await.len();
        self.cache.delete(keys::HUMOR_POOL).await;
        Some(collected)
    }

    /// Latest items, optionally of one kind
    #[instrument(skip(self))]
    pub async fn list(&self, kind: Option<HumorKind>, page: PageRequest) -> Page<HumorItem> {
        let mut items: Vec<HumorItem> = self
            .pool()
            .await
            .into_iter()
            .filter(|item| kind.map_or(true, |k| item.kind == k))
            .collect();
        items.sort_by(latest_first);
        page.paginate(items)
    }

    /// Most upvoted items
    pub async fn trending(&self, limit: usize) -> Vec<HumorItem> {
        let mut items = self.pool().await;
        items.sort_by(|a, b| b.upvotes.cmp(&a.upvotes).then_with(|| latest_first(a, b)));
        items.truncate(limit);
        items
    }
}

fn latest_first(a: &HumorItem, b: &HumorItem) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn demo() -> HumorService {
        HumorService::new(
            Capabilities::demo(),
            CacheLayer::disabled(),
            CollectorSet::new(Duration::from_secs(8)),
            None,
        )
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let page = demo()
            .list(Some(HumorKind::Gif), PageRequest::clamped(None, None, 20, 50))
            .await;
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|item| item.kind == HumorKind::Gif));
    }

    #[tokio::test]
    async fn test_list_is_latest_first() {
        let page = demo().list(None, PageRequest::clamped(None, None, 20, 50)).await;
        assert!(page
            .items
            .windows(2)
            .all(|w| w[0].published_at >= w[1].published_at));
    }

    #[tokio::test]
    async fn test_trending_by_upvotes() {
        let top = demo().trending(2).await;
        assert_eq!(top.len(), 2);
        assert!(top[0].upvotes >= top[1].upvotes);
        assert_eq!(top[0].upvotes, 18_204);
    }
}
