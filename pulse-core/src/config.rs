//! Dashboard configuration loaded from environment variables

use std::env;
use std::time::Duration;

/// Default provider identity
const DEFAULT_USER_AGENT: &str = "PulseDashboard/1.0";
/// SEC EDGAR requires a contact address in the user agent
const DEFAULT_SEC_USER_AGENT: &str = "PulseDashboard/1.0 ops@pulse-dashboard.dev";

/// Configuration for the whole dashboard
///
/// Which optional fields are present decides the process capabilities
/// (store, cache, text generation, translation).
#[derive(Debug, Clone)]
pub struct PulseConfig {
    pub server_port: u16,
    /// SQLite store location
    pub database_path: Option<String>,
    /// Redis connection string for the shared cache
    pub redis_url: Option<String>,
    /// Use the in-process cache when no Redis is configured
    pub memory_cache: bool,
    /// Collect from providers even without a store
    pub live_feeds: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub deepl_api_key: Option<String>,
    /// Language headlines are translated into (DeepL code)
    pub translation_target: String,
    pub giphy_api_key: Option<String>,
    /// Shared secret for provider-triggered batch endpoints
    pub cron_secret: Option<String>,
    /// Running behind a reverse proxy that sets `X-Forwarded-For`
    pub trust_proxy: bool,
    pub collector_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub sec_user_agent: String,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            database_path: None,
            redis_url: None,
            memory_cache: false,
            live_feeds: false,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            deepl_api_key: None,
            translation_target: "EN".to_string(),
            giphy_api_key: None,
            cron_secret: None,
            trust_proxy: false,
            collector_timeout: Duration::from_secs(8),
            request_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sec_user_agent: DEFAULT_SEC_USER_AGENT.to_string(),
        }
    }
}

impl PulseConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let server_port = match get("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
                field: "SERVER_PORT",
                value: raw,
            })?,
            None => defaults.server_port,
        };

        let collector_timeout = parse_secs(&get, "COLLECTOR_TIMEOUT_SECS")?
            .unwrap_or(defaults.collector_timeout);
        let request_timeout = parse_secs(&get, "REQUEST_TIMEOUT_SECS")?
            .unwrap_or(defaults.request_timeout);

        if collector_timeout >= request_timeout {
            return Err(ConfigError::TimeoutOrder {
                collector_secs: collector_timeout.as_secs(),
                request_secs: request_timeout.as_secs(),
            });
        }

        Ok(Self {
            server_port,
            database_path: get("DATABASE_PATH"),
            redis_url: get("REDIS_URL"),
            memory_cache: get("CACHE_BACKEND").is_some_and(|v| v.eq_ignore_ascii_case("memory")),
            live_feeds: get("LIVE_FEEDS").is_some_and(|v| is_truthy(&v)),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            deepl_api_key: get("DEEPL_API_KEY"),
            translation_target: get("TRANSLATION_TARGET_LANG")
                .map(|v| v.to_uppercase())
                .unwrap_or(defaults.translation_target),
            giphy_api_key: get("GIPHY_API_KEY"),
            cron_secret: get("CRON_SECRET"),
            trust_proxy: get("TRUST_PROXY").is_some_and(|v| is_truthy(&v)),
            collector_timeout,
            request_timeout,
            user_agent: get("PULSE_USER_AGENT").unwrap_or(defaults.user_agent),
            sec_user_agent: get("SEC_USER_AGENT").unwrap_or(defaults.sec_user_agent),
        })
    }
}

fn parse_secs<F>(get: &F, field: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(field) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::InvalidNumber { field, value: raw }),
        },
        None => Ok(None),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid number in {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("COLLECTOR_TIMEOUT_SECS ({collector_secs}) must be shorter than REQUEST_TIMEOUT_SECS ({request_secs})")]
    TimeoutOrder { collector_secs: u64, request_secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = PulseConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_port, 3001);
        assert!(config.database_path.is_none());
        assert!(!config.memory_cache);
        assert!(!config.live_feeds);
        assert_eq!(config.translation_target, "EN");
        assert!(!config.trust_proxy);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = PulseConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_reads_optional_providers() {
        let config = PulseConfig::from_lookup(lookup(&[
            ("DATABASE_PATH", "data/pulse.db"),
            ("CACHE_BACKEND", "Memory"),
            ("LIVE_FEEDS", "yes"),
            ("TRANSLATION_TARGET_LANG", "ko"),
            ("TRUST_PROXY", "true"),
        ]))
        .unwrap();
        assert_eq!(config.database_path.as_deref(), Some("data/pulse.db"));
        assert!(config.memory_cache);
        assert!(config.live_feeds);
        assert_eq!(config.translation_target, "KO");
        assert!(config.trust_proxy);
    }

    #[test]
    fn test_collector_timeout_must_be_shorter() {
        let err = PulseConfig::from_lookup(lookup(&[
            ("COLLECTOR_TIMEOUT_SECS", "30"),
            ("REQUEST_TIMEOUT_SECS", "20"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::TimeoutOrder { .. }));
    }

    #[test]
    fn test_invalid_port() {
        let err = PulseConfig::from_lookup(lookup(&[("SERVER_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { field: "SERVER_PORT", .. }));
    }
}
