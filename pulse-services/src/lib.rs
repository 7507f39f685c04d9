//! Business logic services for the Pulse dashboard
//!
//! This crate provides the service layer between the collectors and the HTTP
//! surface: cache-aside storage, capability-driven degradation to fallback
//! data, feed assembly, admission control and the domain services.

pub mod brief_service;
pub mod cache;
pub mod capabilities;
pub mod engagement;
pub mod fallback;
pub mod feed;
pub mod humor_service;
pub mod market_service;
pub mod news_service;
pub mod rate_limiter;
pub mod store;
pub mod text;
pub mod watchdog;

pub use brief_service::BriefService;
pub use cache::{CacheBackend, CacheError, CacheLayer, MemoryBackend, RedisBackend};
pub use capabilities::Capabilities;
pub use engagement::{BookmarkReceipt, EngagementService, VoteReceipt};
pub use feed::{query_feed, trending, trending_score};
pub use humor_service::HumorService;
pub use market_service::{MarketResource, MarketService};
pub use news_service::NewsService;
pub use rate_limiter::{Admission, RateLimiter, RateLimiterStats, RatePolicy, RouteClass};
pub use store::{SqliteStore, Store, StoreError};
pub use text::{DeepLTranslator, OpenAiCompleter, TextCompleter, TextError, Translator};
pub use watchdog::{parse_watchlist, MAX_TICKERS};
