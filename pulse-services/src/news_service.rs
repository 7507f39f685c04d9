//! News Service
//!
//! Owns the news pool: where it comes from (fallback data, the store, or a
//! live collection cycle), how long it is cached, and translation backfill
//! for country-scoped feeds.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use pulse_collectors::{normalize_all, CollectorSet};
use pulse_core::{
    CountryNews, FeedQuery, NewsItem, Page, PulseError, PulseResult, SortOrder,
};

use crate::cache::{keys, ttl, CacheLayer};
use crate::capabilities::Capabilities;
use crate::fallback;
use crate::feed::{dedupe_by_id, query_feed, sort_items, trending};
use crate::store::Store;
use crate::text::Translator;

/// Items kept in the news pool
const POOL_SIZE: usize = 500;

/// Primary language of a country's press, as a DeepL language code
pub fn country_language(country: &str) -> Option<&'static str> {
    let language = match country.to_uppercase().as_str() {
        "US" | "GB" | "AU" | "CA" | "IE" | "NZ" | "QA" | "IN" | "SG" => "EN",
        "KR" => "KO",
        "JP" => "JA",
        "CN" | "TW" | "HK" => "ZH",
        "DE" | "AT" => "DE",
        "FR" => "FR",
        "ES" | "MX" | "AR" => "ES",
        "IT" => "IT",
        "BR" | "PT" => "PT",
        _ => return None,
    };
    Some(language)
}

/// Whether headlines from `country` need translating into `target`
/// (`EN`, `EN-US` and `en` all count as English)
pub fn needs_translation(country: &str, target: &str) -> bool {
    let target = target.split('-').next().unwrap_or_default().to_uppercase();
    country_language(country).is_some_and(|language| language != target)
}

/// News pool, feed queries and translation backfill
pub struct NewsService {
    caps: Capabilities,
    cache: CacheLayer,
    collectors: CollectorSet,
    store: Option<Arc<dyn Store>>,
    translator: Option<Arc<dyn Translator>>,
    target_language: String,
}

impl NewsService {
    pub fn new(
        caps: Capabilities,
        cache: CacheLayer,
        collectors: CollectorSet,
        store: Option<Arc<dyn Store>>,
    ) -> Self {
        info!(
            "Initializing NewsService (live: {}, store: {}, collectors: {:?})",
            caps.is_live(),
            store.is_some(),
            collectors.names()
        );
        Self {
            caps,
            cache,
            collectors,
            store,
            translator: None,
            target_language: "EN".to_string(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>, target_language: &str) -> Self {
        self.translator = Some(translator);
        self.target_language = target_language.to_uppercase();
        self
    }

    /// Names of the collectors feeding this pool
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.names()
    }

    /// The current news pool
    pub async fn pool(&self) -> Vec<NewsItem> {
        if self.caps.is_demo() {
            return fallback::news();
        }

        self.cache
            .get_or_compute(keys::NEWS_POOL, ttl::NEWS_POOL, || self.build_pool())
            .await
    }

    /// Store contents when available, otherwise a live collection cycle
    async fn build_pool(&self) -> Vec<NewsItem> {
        if let Some(store) = &self.store {
            match store.recent_news(POOL_SIZE).await {
                Ok(items) if !items.is_empty() => {
                    debug!("[NEWS] Loaded {} items from store", items.len());
                    return items;
                }
                Ok(_) => debug!("[NEWS] Store empty, collecting live"),
                Err(e) => warn!("[NEWS] Store read failed, collecting live: {}", e),
            }
        }

        let items = self.collect(&self.collectors).await;
        let mut pool = dedupe_by_id(items);
        sort_items(&mut pool, SortOrder::Latest);
        pool.truncate(POOL_SIZE);
        pool
    }

    /// Run a collector set, persisting what it produced
    async fn collect(&self, collectors: &CollectorSet) -> Vec<NewsItem> {
        let batch = normalize_all(collectors.collect_all().await);
        info!(
            "[NEWS] Collected {} items ({} rejected)",
            batch.news.len(),
            batch.rejected
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.upsert_news(&batch.news).await {
                warn!("[NEWS] Failed to persist collected items: {}", e);
            }
        }
        batch.news
    }

    /// Run one named collector now and refresh the pool. `None` when the
    /// collector does not feed news.
    #[instrument(skip(self))]
    pub async fn collect_from(&self, name: &str) -> Option<usize> {
        if !self.collectors.contains(name) {
            return None;
        }

        let collected = self.collect(&self.collectors.subset(&[name])).await.len();
        self.cache.delete(keys::NEWS_POOL).await;
        Some(collected)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &FeedQuery) -> Page<NewsItem> {
        let pool = self.pool().await;
        query_feed(&pool, query)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> PulseResult<NewsItem> {
        if let Some(item) = self.pool().await.into_iter().find(|item| item.id == id) {
            return Ok(item);
        }

        if let Some(store) = &self.store {
            if let Some(item) = store.get_news(id).await? {
                return Ok(item);
            }
        }

        Err(PulseError::not_found(format!("news item {id}")))
    }

    /// Latest items from one country, with translated headlines where needed
    #[instrument(skip(self))]
    pub async fn by_country(&self, country: &str, limit: usize) -> CountryNews {
        let country = country.trim().to_uppercase();
        let mut items: Vec<NewsItem> = self
            .pool()
            .await
            .into_iter()
            .filter(|item| item.country == country)
            .collect();
        sort_items(&mut items, SortOrder::Latest);
        items.truncate(limit);

        if needs_translation(&country, &self.target_language) {
            self.backfill_translations(&mut items).await;
        }

        CountryNews { items, country }
    }

    /// Top items by trending score
    pub async fn trends(&self, limit: usize) -> Vec<NewsItem> {
        trending(&self.pool().await, limit)
    }

    /// Fill missing translations: cached ones first, then a single batch call
    /// for the rest. Failures leave the originals untouched.
    async fn backfill_translations(&self, items: &mut [NewsItem]) {
        let Some(translator) = &self.translator else {
            return;
        };
        let target = self.target_language.as_str();

        let mut pending = Vec::new();
        for (idx, item) in items.iter_mut().enumerate() {
            if !item.needs_translation() {
                continue;
            }
            let key = keys::translation(&item.id, target);
            match self.cache.get::<String>(&key).await {
                Some(cached) => {
                    item.apply_translation(&cached);
                }
                None => pending.push(idx),
            }
        }

        if pending.is_empty() {
            return;
        }

        let texts: Vec<String> = pending.iter().map(|&idx| items[idx].title.clone()).collect();
        let translated = match translator.translate_batch(&texts, target).await {
            Ok(translated) if translated.len() == texts.len() => translated,
            Ok(translated) => {
                warn!(
                    "[TRANSLATE] Expected {} translations, got {}",
                    texts.len(),
                    translated.len()
                );
                return;
            }
            Err(e) => {
                warn!("[TRANSLATE] Batch failed, keeping originals: {}", e);
                return;
            }
        };

        let mut stored = Vec::new();
        for (idx, text) in pending.into_iter().zip(translated) {
            let item = &mut items[idx];
            // Identical output means the provider could not translate it
            if item.apply_translation(&text) {
                if let Some(translation) = &item.title_translated {
                    self.cache
                        .set(&keys::translation(&item.id, target), translation, ttl::NEWS_POOL)
                        .await;
                    stored.push((item.id.clone(), translation.clone()));
                }
            }
        }

        debug!("[TRANSLATE] Translated {} headlines", stored.len());
        if let Some(store) = &self.store {
            if let Err(e) = store.save_translations(&stored).await {
                warn!("[TRANSLATE] Failed to persist translations: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_needed_only_across_languages() {
        assert!(needs_translation("kr", "EN"));
        assert!(needs_translation("JP", "en-us"));
        assert!(!needs_translation("US", "EN-GB"));
        assert!(!needs_translation("KR", "KO"));
        // Unknown press language
        assert!(!needs_translation("ZZ", "EN"));
    }
}
