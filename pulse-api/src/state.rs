//! Application state shared across handlers

use std::sync::Arc;

use tracing::{info, warn};

use pulse_collectors::{humor_collectors, market_collectors, news_collectors};
use pulse_core::{PulseConfig, PulseError};
use pulse_services::{
    BriefService, CacheLayer, Capabilities, DeepLTranslator, EngagementService, HumorService,
    MarketService, NewsService, OpenAiCompleter, RateLimiter, SqliteStore, Store, TextCompleter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PulseConfig>,
    pub caps: Capabilities,
    pub cache: CacheLayer,
    pub news: Arc<NewsService>,
    pub market: Arc<MarketService>,
    pub humor: Arc<HumorService>,
    pub briefs: Arc<BriefService>,
    pub engagement: Arc<EngagementService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire every service from configuration. Optional collaborators that
    /// are not configured are simply left out.
    pub async fn build(config: PulseConfig) -> Result<Self, PulseError> {
        let caps = Capabilities::from_config(&config);
        info!("Capabilities: {:?}", caps);

        let cache = CacheLayer::from_settings(config.redis_url.as_deref(), config.memory_cache).await;

        let store: Option<Arc<dyn Store>> = match &config.database_path {
            Some(path) => {
                info!("Opening store at: {}", path);
                let store = SqliteStore::open(path).map_err(PulseError::from)?;
                Some(Arc::new(store))
            }
            None => None,
        };

        let mut news = NewsService::new(
            caps,
            cache.clone(),
            news_collectors(&config),
            store.clone(),
        );
        match &config.deepl_api_key {
            Some(key) => {
                news = news.with_translator(Arc::new(DeepLTranslator::new(key)), &config.translation_target);
            }
            None => info!("No DEEPL_API_KEY - headlines will not be translated"),
        }
        let news = Arc::new(news);

        let market = Arc::new(MarketService::new(caps, cache.clone(), market_collectors(&config)));
        let humor = Arc::new(HumorService::new(
            caps,
            cache.clone(),
            humor_collectors(&config),
            store.clone(),
        ));

        let completer: Option<Arc<dyn TextCompleter>> = match &config.openai_api_key {
            Some(key) => Some(Arc::new(OpenAiCompleter::new(key, &config.openai_model))),
            None => {
                info!("No OPENAI_API_KEY - briefs will use templated summaries");
                None
            }
        };
        let briefs = Arc::new(BriefService::new(
            caps,
            cache.clone(),
            store.clone(),
            Arc::clone(&news),
            Arc::clone(&market),
            completer,
        ));

        if config.cron_secret.is_none() {
            warn!("No CRON_SECRET - cron endpoints are disabled");
        }

        Ok(Self {
            config: Arc::new(config),
            caps,
            cache,
            news,
            market,
            humor,
            briefs,
            engagement: Arc::new(EngagementService::new(store)),
            rate_limiter: Arc::new(RateLimiter::new()),
        })
    }

    /// State with no external collaborators, serving fallback data
    pub async fn demo() -> Result<Self, PulseError> {
        Self::build(PulseConfig::default()).await
    }
}
