//! Standard collector sets, built from configuration

use pulse_core::PulseConfig;

use crate::collector::CollectorSet;
use crate::crypto::CryptoCollector;
use crate::filings::FilingsCollector;
use crate::forex::ForexCollector;
use crate::giphy::GiphyCollector;
use crate::hacker_news::HackerNewsCollector;
use crate::indices::IndicesCollector;
use crate::reddit::RedditCollector;
use crate::rss::RssCollector;
use crate::sentiment::FearGreedCollector;
use crate::xkcd::XkcdCollector;

/// Collectors feeding the news pool
pub fn news_collectors(config: &PulseConfig) -> CollectorSet {
    CollectorSet::new(config.collector_timeout)
        .with(RssCollector::news(&config.user_agent))
        .with(HackerNewsCollector::new(&config.user_agent))
        .with(RedditCollector::news(&config.user_agent))
        .with(FilingsCollector::new(&config.sec_user_agent))
}

/// Collectors feeding the market snapshot
pub fn market_collectors(config: &PulseConfig) -> CollectorSet {
    CollectorSet::new(config.collector_timeout)
        .with(CryptoCollector::new(&config.user_agent))
        .with(IndicesCollector::new(&config.user_agent))
        .with(ForexCollector::new(&config.user_agent))
        .with(FearGreedCollector::new(&config.user_agent))
}

/// Collectors feeding the humor pool
pub fn humor_collectors(config: &PulseConfig) -> CollectorSet {
    CollectorSet::new(config.collector_timeout)
        .with(RedditCollector::humor(&config.user_agent))
        .with(RssCollector::satire(&config.user_agent))
        .with(XkcdCollector::new(&config.user_agent))
        .with(GiphyCollector::new(&config.user_agent, config.giphy_api_key.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_names_are_unique() {
        let config = PulseConfig::default();
        let mut names: Vec<&str> = news_collectors(&config)
            .names()
            .into_iter()
            .chain(market_collectors(&config).names())
            .chain(humor_collectors(&config).names())
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 12);
    }
}
