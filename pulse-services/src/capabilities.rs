//! Degradation Controller
//!
//! Process-wide capability flags, computed once at startup. Services consult
//! these instead of inspecting configuration themselves.

use serde::Serialize;

use pulse_core::PulseConfig;

/// What the running process can do with its configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// A persistent store is configured
    pub store: bool,
    /// A cache backend is configured
    pub cache: bool,
    /// Text generation credentials are present
    pub text_generation: bool,
    /// Translation credentials are present
    pub translation: bool,
    /// Live provider collection is enabled without a store
    pub live_feeds: bool,
}

impl Capabilities {
    pub fn from_config(config: &PulseConfig) -> Self {
        Self {
            store: config.database_path.is_some(),
            cache: config.redis_url.is_some() || config.memory_cache,
            text_generation: config.openai_api_key.is_some(),
            translation: config.deepl_api_key.is_some(),
            live_feeds: config.live_feeds,
        }
    }

    /// No external collaborators at all
    pub fn demo() -> Self {
        Self::default()
    }

    /// Serve collected data rather than fallback data
    pub fn is_live(&self) -> bool {
        self.store || self.live_feeds
    }

    pub fn is_demo(&self) -> bool {
        !self.is_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_demo() {
        let caps = Capabilities::from_config(&PulseConfig::default());
        assert!(caps.is_demo());
        assert_eq!(caps, Capabilities::demo());
    }

    #[test]
    fn test_live_feeds_without_store() {
        let config = PulseConfig {
            live_feeds: true,
            memory_cache: true,
            ..PulseConfig::default()
        };
        let caps = Capabilities::from_config(&config);
        assert!(caps.is_live());
        assert!(caps.cache);
        assert!(!caps.store);
    }

    #[test]
    fn test_store_implies_live() {
        let config = PulseConfig {
            database_path: Some(":memory:".to_string()),
            ..PulseConfig::default()
        };
        assert!(Capabilities::from_config(&config).is_live());
    }
}
