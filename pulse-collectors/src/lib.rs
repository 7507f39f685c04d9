//! Provider adapters for the Pulse dashboard
//!
//! This crate provides one collector per external source and the normalizer
//! that turns their raw payloads into canonical items:
//! - News: curated RSS/Atom feeds, Hacker News, Reddit, SEC EDGAR filings
//! - Market: CoinGecko, Yahoo Finance charts, Frankfurter rates, Fear & Greed
//! - Humor: Reddit meme subreddits, satire feeds, xkcd, Giphy (optional)

pub mod collector;
pub mod crypto;
pub mod error;
pub mod filings;
pub mod forex;
pub mod giphy;
pub mod hacker_news;
mod http;
pub mod indices;
pub mod normalize;
pub mod record;
pub mod reddit;
pub mod registry;
pub mod rss;
pub mod sentiment;
pub mod xkcd;

pub use collector::{Collector, CollectorSet};
pub use crypto::CryptoCollector;
pub use error::CollectError;
pub use filings::FilingsCollector;
pub use forex::ForexCollector;
pub use giphy::GiphyCollector;
pub use hacker_news::HackerNewsCollector;
pub use indices::IndicesCollector;
pub use normalize::{normalize, normalize_all, stable_id, NormalizedBatch, NormalizedItem};
pub use record::{
    ComicStrip, Destination, FeedEntry, FilingEntry, GifEntry, LinkPost, RawQuote, RawRecord,
    RawSentiment, RawTime, SourceProfile,
};
pub use reddit::{RedditCollector, Subreddit};
pub use registry::{humor_collectors, market_collectors, news_collectors};
pub use rss::{curated_news_feeds, satire_feeds, RssCollector, RssFeed};
pub use sentiment::FearGreedCollector;
pub use xkcd::XkcdCollector;
