//! Core types for the Pulse dashboard
//!
//! This crate defines the canonical item shapes every collector normalizes
//! into, the feed query value types, pagination, configuration and the
//! dashboard-wide error taxonomy.

pub mod brief;
pub mod config;
pub mod error;
pub mod humor;
pub mod market;
pub mod news;
pub mod prediction;
pub mod query;

pub use brief::{
    parse_week_start, week_start_of, DailyBrief, Industry, IndustryReport, BRIEF_TOP_NEWS,
};
pub use config::{ConfigError, PulseConfig};
pub use error::{PulseError, PulseResult};
pub use humor::{HumorItem, HumorKind};
pub use market::{FearGreedReading, MarketQuote, MarketSnapshot};
pub use news::{CountryNews, NewsCategory, NewsItem};
pub use prediction::{Prediction, VoteChoice, VoteTally};
pub use query::{
    sanitize_search, FeedQuery, Page, PageRequest, SortOrder, MAX_PAGE, SEARCH_MAX_LEN,
};
