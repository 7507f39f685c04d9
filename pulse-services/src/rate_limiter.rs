//! Per-route request admission control
//!
//! Sliding-window log per `(class, caller)`: a request is admitted only if
//! fewer than `limit` requests were admitted in the trailing window, so no
//! caller ever exceeds `limit` in any window of that length.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info};

/// Policy class of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Read endpoints served from the cache
    Cached,
    /// Endpoints that may hit providers or translation
    Uncached,
    /// Votes and bookmarks
    Write,
    /// Provider-triggered batch endpoints
    Collect,
}

impl RouteClass {
    pub const ALL: [RouteClass; 4] = [
        RouteClass::Cached,
        RouteClass::Uncached,
        RouteClass::Write,
        RouteClass::Collect,
    ];

    pub fn policy(&self) -> RatePolicy {
        let window = Duration::from_secs(60);
        let limit = match self {
            RouteClass::Cached => 120,
            RouteClass::Uncached => 30,
            RouteClass::Write => 20,
            RouteClass::Collect => 10,
        };
        RatePolicy { limit, window }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Cached => "cached",
            RouteClass::Uncached => "uncached",
            RouteClass::Write => "write",
            RouteClass::Collect => "collect",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most `limit` admissions per trailing `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub limit: u32,
    pub window: Duration,
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u32 },
    Blocked { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Shared limiter for every route class
#[derive(Debug, Default)]
pub struct RateLimiter {
    logs: DashMap<(RouteClass, String), VecDeque<Instant>>,
    /// Counter for debugging - admitted requests
    admitted: AtomicU64,
    /// Counter for debugging - rejected requests
    blocked: AtomicU64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or reject one request from `caller` on a route of `class`
    pub fn admit(&self, caller: &str, class: RouteClass) -> Admission {
        let policy = class.policy();
        let now = Instant::now();

        let mut log = self
            .logs
            .entry((class, caller.to_string()))
            .or_default();
        evict_expired(&mut log, now, policy.window);

        if (log.len() as u32) < policy.limit {
            log.push_back(now);
            self.admitted.fetch_add(1, Ordering::Relaxed);
            Admission::Allowed {
                remaining: policy.limit - log.len() as u32,
            }
        } else {
            self.blocked.fetch_add(1, Ordering::Relaxed);
            // The oldest admission leaves the window first
            let retry_after = log
                .front()
                .map(|oldest| (*oldest + policy.window).saturating_duration_since(now))
                .unwrap_or(policy.window);

            debug!(
                "[RATE_LIMITER:{}] BLOCKED {} - retry after {:?}",
                class, caller, retry_after
            );
            Admission::Blocked { retry_after }
        }
    }

    /// Drop expired log entries and empty logs
    pub fn prune(&self) {
        let now = Instant::now();
        let before = self.logs.len();
        self.logs.retain(|(class, _), log| {
            evict_expired(log, now, class.policy().window);
            !log.is_empty()
        });
        let removed = before.saturating_sub(self.logs.len());
        if removed > 0 {
            info!("[RATE_LIMITER] Pruned {} idle callers", removed);
        }
    }

    /// Number of tracked `(class, caller)` logs
    pub fn tracked(&self) -> usize {
        self.logs.len()
    }

    /// Get statistics about this rate limiter (for debugging)
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            tracked_callers: self.logs.len(),
        }
    }
}

fn evict_expired(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while log
        .front()
        .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= window)
    {
        log.pop_front();
    }
}

/// Statistics about rate limiter usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterStats {
    pub admitted: u64,
    pub blocked: u64,
    pub tracked_callers: usize,
}
