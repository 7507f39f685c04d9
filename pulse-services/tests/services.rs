use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};

use pulse_collectors::{
    CollectError, Collector, CollectorSet, FeedEntry, RawRecord, RawTime, SourceProfile,
};
use pulse_core::{FeedQuery, Industry, NewsCategory, PageRequest, PulseError};
use pulse_services::{
    fallback, BriefService, CacheLayer, Capabilities, MarketService, NewsService, SqliteStore,
    Store, TextCompleter, TextError, Translator,
};

/// Serves a fixed set of feed entries and counts how often it ran
struct StaticFeed {
    calls: Arc<AtomicUsize>,
}

fn entry(title: &str, country: &str, path: &str, hours_ago: i64) -> RawRecord {
    let published = fallback::anchor() - ChronoDuration::hours(hours_ago);
    RawRecord::Feed(FeedEntry {
        profile: SourceProfile::news("Example Wire", country, NewsCategory::Tech),
        title: Some(title.to_string()),
        link: Some(format!("https://wire.example.com/{path}")),
        published: RawTime::Parsed(published),
        summary_html: None,
        image_url: None,
        collected_at: fallback::anchor(),
    })
}

#[async_trait]
impl Collector for StaticFeed {
    fn name(&self) -> &'static str {
        "rss"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            entry("반도체 수출 급증", "KR", "chips", 1),
            entry("Hyundai", "KR", "hyundai", 2),
            entry("Semiconductor stocks rally", "US", "rally", 3),
        ])
    }
}

/// Prefixes multi-word text; single words come back unchanged
struct FakeTranslator {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate_batch(&self, texts: &[String], _target: &str) -> Result<Vec<String>, TextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                if t.contains(' ') {
                    format!("EN: {t}")
                } else {
                    t.clone()
                }
            })
            .collect())
    }
}

struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate_batch(&self, _texts: &[String], _target: &str) -> Result<Vec<String>, TextError> {
        Err(TextError::Api {
            status: 456,
            message: "quota".to_string(),
        })
    }
}

struct CannedCompleter;

#[async_trait]
impl TextCompleter for CannedCompleter {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, TextError> {
        Ok("Generated summary.".to_string())
    }
}

fn live_caps() -> Capabilities {
    Capabilities {
        store: true,
        cache: true,
        ..Capabilities::default()
    }
}

struct Fixture {
    news: Arc<NewsService>,
    store: Arc<dyn Store>,
    collector_calls: Arc<AtomicUsize>,
    translator_calls: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let collector_calls = Arc::new(AtomicUsize::new(0));
    let translator_calls = Arc::new(AtomicUsize::new(0));

    let collectors = CollectorSet::new(Duration::from_secs(8)).with(StaticFeed {
        calls: collector_calls.clone(),
    });
    let news = NewsService::new(live_caps(), CacheLayer::memory(), collectors, Some(store.clone()))
        .with_translator(
            Arc::new(FakeTranslator {
                calls: translator_calls.clone(),
            }),
            "EN",
        );

    Fixture {
        news: Arc::new(news),
        store,
        collector_calls,
        translator_calls,
    }
}

#[tokio::test]
async fn test_empty_store_triggers_one_collection_and_persists() {
    let fx = fixture();

    let page = fx
        .news
        .list(&FeedQuery::new(PageRequest::clamped(None, None, 20, 50)))
        .await;
    assert_eq!(page.total, 3);
    assert_eq!(fx.store.recent_news(10).await.unwrap().len(), 3);

    // Second read comes from the cache
    fx.news.trends(10).await;
    assert_eq!(fx.collector_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_country_feed_backfills_translations_once() {
    let fx = fixture();

    let kr = fx.news.by_country("kr", 20).await;
    assert_eq!(kr.country, "KR");
    assert_eq!(kr.items.len(), 2);

    for item in &kr.items {
        assert_ne!(item.title_translated.as_deref(), Some(item.title.as_str()));
    }
    let chips = kr.items.iter().find(|i| i.title == "반도체 수출 급증").unwrap();
    assert_eq!(chips.title_translated.as_deref(), Some("EN: 반도체 수출 급증"));
    let single = kr.items.iter().find(|i| i.title == "Hyundai").unwrap();
    assert!(single.title_translated.is_none());

    // The translation is persisted
    let stored = fx.store.get_news(&chips.id).await.unwrap().unwrap();
    assert_eq!(stored.title_translated, chips.title_translated);

    // Cached translations are reused; only the untranslatable one is retried
    fx.news.by_country("KR", 20).await;
    assert_eq!(fx.translator_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_same_language_country_is_not_translated() {
    let fx = fixture();
    let us = fx.news.by_country("US", 20).await;
    assert_eq!(us.items.len(), 1);
    assert!(us.items[0].title_translated.is_none());
    assert_eq!(fx.translator_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_translation_failure_keeps_originals() {
    let collectors = CollectorSet::new(Duration::from_secs(8)).with(StaticFeed {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let news = NewsService::new(live_caps(), CacheLayer::disabled(), collectors, None)
        .with_translator(Arc::new(FailingTranslator), "EN");

    let kr = news.by_country("KR", 20).await;
    assert_eq!(kr.items.len(), 2);
    assert!(kr.items.iter().all(|i| i.title_translated.is_none()));
}

#[tokio::test]
async fn test_unknown_news_id_is_not_found() {
    let fx = fixture();
    let err = fx.news.get("does-not-exist").await.unwrap_err();
    assert!(matches!(err, PulseError::NotFound(_)));

    let first = fx.news.trends(1).await.remove(0);
    assert_eq!(fx.news.get(&first.id).await.unwrap(), first);
}

#[tokio::test]
async fn test_collect_from_reports_count_and_ignores_other_collectors() {
    let fx = fixture();
    assert_eq!(fx.news.collect_from("rss").await, Some(3));
    assert_eq!(fx.news.collect_from("crypto").await, None);
}

fn brief_service(fx: &Fixture, completer: bool) -> BriefService {
    let market = Arc::new(MarketService::new(
        live_caps(),
        CacheLayer::memory(),
        CollectorSet::new(Duration::from_secs(8)),
    ));
    let completer: Option<Arc<dyn TextCompleter>> = if completer {
        Some(Arc::new(CannedCompleter))
    } else {
        None
    };

    BriefService::new(
        live_caps(),
        CacheLayer::memory(),
        Some(fx.store.clone()),
        fx.news.clone(),
        market,
        completer,
    )
}

#[tokio::test]
async fn test_todays_brief_is_generated_and_stored() {
    let fx = fixture();
    let briefs = brief_service(&fx, true);
    let today = fallback::anchor_date();

    let brief = briefs.today(today).await.unwrap();
    assert_eq!(brief.summary, "Generated summary.");
    assert_eq!(brief.top_news.len(), 3);
    assert_eq!(fx.store.get_brief(today).await.unwrap(), Some(brief.clone()));

    assert_eq!(briefs.by_date(today, today).await.unwrap(), brief);
}

#[tokio::test]
async fn test_missing_past_brief_is_not_found() {
    let fx = fixture();
    let briefs = brief_service(&fx, false);
    let today = fallback::anchor_date();
    let yesterday = today.pred_opt().unwrap();

    assert!(matches!(
        briefs.by_date(yesterday, today).await.unwrap_err(),
        PulseError::NotFound(_)
    ));
    assert!(matches!(
        briefs.by_date(today.succ_opt().unwrap(), today).await.unwrap_err(),
        PulseError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_weekly_reports_are_generated_for_every_industry() {
    let fx = fixture();
    let briefs = brief_service(&fx, false);
    let thursday = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap();
    let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();

    assert!(matches!(
        briefs.report(Industry::Semiconductor, monday).await.unwrap_err(),
        PulseError::NotFound(_)
    ));

    let generated = briefs.generate_weekly_reports(thursday, fallback::anchor()).await;
    assert_eq!(generated, Industry::ALL.len());

    let report = briefs.report(Industry::Semiconductor, monday).await.unwrap();
    assert_eq!(report.week_start, monday);
    assert_eq!(report.source_count, 1);
    assert_eq!(report.highlights, vec!["Semiconductor stocks rally".to_string()]);
}
