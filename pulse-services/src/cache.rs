//! Cache-Aside Layer
//!
//! Generic get-or-compute-and-store keyed by logical resource identity.
//! Payloads are stored as JSON under a versioned key prefix. When no backend
//! is configured, or the backend fails, every read is a miss and every write
//! a no-op, so callers always fall through to their compute function.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Prefix shared by every key; bump the version to orphan old payloads
pub const KEY_PREFIX: &str = "pulse:v1:";

/// Time-to-live per resource
pub mod ttl {
    use std::time::Duration;

    pub const CRYPTO: Duration = Duration::from_secs(2 * 60);
    pub const INDICES: Duration = Duration::from_secs(5 * 60);
    pub const FOREX: Duration = Duration::from_secs(30 * 60);
    pub const FEAR_GREED: Duration = Duration::from_secs(30 * 60);
    pub const NEWS_POOL: Duration = Duration::from_secs(10 * 60);
    pub const HUMOR_POOL: Duration = Duration::from_secs(30 * 60);
    pub const BRIEF: Duration = Duration::from_secs(24 * 60 * 60);
    pub const REPORT: Duration = Duration::from_secs(6 * 60 * 60);
}

/// Logical cache keys (without the shared prefix)
pub mod keys {
    use chrono::NaiveDate;
    use pulse_core::Industry;

    pub const CRYPTO: &str = "market:crypto";
    pub const INDICES: &str = "market:indices";
    pub const FOREX: &str = "market:forex";
    pub const FEAR_GREED: &str = "market:fear-greed";
    pub const NEWS_POOL: &str = "news:pool";
    pub const HUMOR_POOL: &str = "humor:pool";

    /// Date-bucketed daily brief key
    pub fn brief(date: NaiveDate) -> String {
        format!("brief:{}", date.format("%Y-%m-%d"))
    }

    pub fn report(industry: Industry, week_start: NaiveDate) -> String {
        format!("report:{}:{}", industry.as_str(), week_start.format("%Y-%m-%d"))
    }

    /// Translated headline for one news item and target language
    pub fn translation(news_id: &str, target: &str) -> String {
        format!("translation:{}:{}", target.to_lowercase(), news_id)
    }
}

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// A key/value store with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Evict expired entries, returning how many were dropped. Backends
    /// that expire keys themselves do nothing here.
    fn prune(&self) -> usize {
        0
    }
}

/// Cache entry with expiration
struct CacheEntry {
    data: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process TTL map
#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let hit = self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data.clone());

        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(hit)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }
}

/// Redis backend using a reconnecting connection manager
#[derive(Clone)]
pub struct RedisBackend {
    conn_manager: ConnectionManager,
    redis_url: String,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("redis_url", &self.redis_url)
            .finish()
    }
}

impl RedisBackend {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        info!("[CACHE] Connecting to Redis at {}", redis_url);
        let client = redis::Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await?;
        Ok(Self {
            conn_manager,
            redis_url: redis_url.to_string(),
        })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn_manager.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        conn.del::<_, i64>(key).await?;
        Ok(())
    }
}

/// Cache-aside front for an optional backend
#[derive(Clone, Default)]
pub struct CacheLayer {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLayer")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A layer that always misses
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Connect to Redis when a URL is given, else use the in-process map when
    /// requested. An unreachable Redis leaves the layer disabled.
    pub async fn from_settings(redis_url: Option<&str>, memory: bool) -> Self {
        if let Some(url) = redis_url {
            match RedisBackend::connect(url).await {
                Ok(backend) => return Self::new(Arc::new(backend)),
                Err(e) => warn!("[CACHE] Redis unavailable, caching disabled: {}", e),
            }
            return Self::disabled();
        }

        if memory {
            info!("[CACHE] Using in-process cache");
            return Self::memory();
        }

        info!("[CACHE] No cache backend configured");
        Self::disabled()
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Evict expired entries from the backend
    pub fn prune(&self) -> usize {
        self.backend.as_ref().map_or(0, |backend| backend.prune())
    }

    fn full_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    /// Read and decode a cached value; any failure is a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let full_key = Self::full_key(key);

        match backend.get(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("[CACHE] HIT {}", full_key);
                    Some(value)
                }
                Err(e) => {
                    warn!("[CACHE] Undecodable payload for {}: {}", full_key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("[CACHE] MISS {}", full_key);
                None
            }
            Err(e) => {
                warn!("[CACHE] GET {} failed: {}", full_key, e);
                None
            }
        }
    }

    /// Encode and store a value, replacing any previous entry
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let full_key = Self::full_key(key);

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("[CACHE] Cannot encode {}: {}", full_key, e);
                return;
            }
        };

        if let Err(e) = backend.set(&full_key, raw, ttl).await {
            warn!("[CACHE] SET {} failed: {}", full_key, e);
        }
    }

    pub async fn delete(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let full_key = Self::full_key(key);
        if let Err(e) = backend.delete(&full_key).await {
            warn!("[CACHE] DEL {} failed: {}", full_key, e);
        }
    }

    /// Return the cached value or compute, store and return a fresh one.
    /// `compute` runs at most once per call. Concurrent callers on a cold key
    /// may each compute; the last write wins.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(hit) = self.get(key).await {
            return hit;
        }

        let value = compute().await;
        self.set(key, &value, ttl).await;
        value
    }

    /// Like [`CacheLayer::get_or_compute`] for fallible computations.
    /// Errors are returned to the caller and never stored.
    pub async fn try_get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let value = compute().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }
}
