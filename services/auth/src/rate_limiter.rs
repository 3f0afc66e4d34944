//! Fixed-window rate limiter for login attempts
//!
//! Attempts are counted per identifier inside a fixed time window. When the
//! window passes, the next attempt starts a fresh window. Bursts straddling
//! a window boundary can therefore see up to twice `max_attempts` in quick
//! succession; that is the documented fixed-window trade-off, not a bug.
//!
//! State is process-local: a mutex-guarded map, so concurrent checks for
//! the same identifier are serialized and the count is never under-counted.
//! A multi-instance deployment would need to move this into a shared store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed per window
    pub max_attempts: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300, // 5 minutes
        }
    }
}

impl RateLimiterConfig {
    /// Create a new RateLimiterConfig from environment variables
    ///
    /// # Environment Variables
    /// - `RATE_LIMIT_MAX_ATTEMPTS`: Attempts allowed per window (default: 5)
    /// - `RATE_LIMIT_WINDOW_SECONDS`: Window length in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_attempts = std::env::var("RATE_LIMIT_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_attempts);

        let window_seconds = std::env::var("RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.window_seconds);

        Self {
            max_attempts,
            window_seconds,
        }
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the attempt is allowed
    pub allowed: bool,
    /// Attempts left in the current window
    pub remaining: u32,
    /// Time until the current window resets
    pub retry_after: Duration,
}

/// Per-identifier window state
#[derive(Debug)]
struct WindowEntry {
    /// Attempts seen in the current window
    count: u32,
    /// When the current window ends
    window_reset_at: Instant,
}

/// Fixed-window rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and decide whether it is allowed
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window = Duration::from_secs(self.config.window_seconds);
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if now <= entry.window_reset_at => {
                if entry.count >= self.config.max_attempts {
                    warn!("Rate limit exceeded for key {}", key);
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        retry_after: entry.window_reset_at - now,
                    };
                }

                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.config.max_attempts - entry.count,
                    retry_after: entry.window_reset_at - now,
                }
            }
            _ => {
                // First attempt for this key, or the previous window passed
                entries.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        window_reset_at: now + window,
                    },
                );

                RateLimitDecision {
                    allowed: true,
                    remaining: self.config.max_attempts - 1,
                    retry_after: window,
                }
            }
        }
    }

    /// Remove entries whose window has passed, bounding memory growth
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    async fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.window_reset_at > now);
        let removed = before - entries.len();

        if removed > 0 {
            info!("Rate limiter sweep removed {} expired entries", removed);
        }

        removed
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 300,
        })
    }

    #[tokio::test]
    async fn test_attempts_within_limit_allowed() {
        let limiter = limiter();
        let now = Instant::now();

        for attempt in 1..=5u32 {
            let decision = limiter.check_at("login:alice@example.com", now).await;
            assert!(decision.allowed, "attempt {} should be allowed", attempt);
            assert_eq!(decision.remaining, 5 - attempt);
        }
    }

    #[tokio::test]
    async fn test_sixth_attempt_denied() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..5 {
            limiter.check_at("login:alice@example.com", now).await;
        }

        let decision = limiter.check_at("login:alice@example.com", now).await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.retry_after, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_window_rollover_allows_again() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..6 {
            limiter.check_at("login:alice@example.com", start).await;
        }

        let later = start + Duration::from_secs(301);
        let decision = limiter.check_at("login:alice@example.com", later).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..6 {
            limiter.check_at("login:alice@example.com", now).await;
        }

        let decision = limiter.check_at("login:bob@example.com", now).await;
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_dead_windows() {
        let limiter = limiter();
        let start = Instant::now();

        limiter.check_at("login:old@example.com", start).await;
        limiter
            .check_at("login:fresh@example.com", start + Duration::from_secs(200))
            .await;

        let removed = limiter.sweep_at(start + Duration::from_secs(301)).await;
        assert_eq!(removed, 1);

        // The fresh key's window (ends at 500s) must survive the sweep
        let entries = limiter.entries.lock().await;
        assert!(entries.contains_key("login:fresh@example.com"));
        assert!(!entries.contains_key("login:old@example.com"));
    }

    #[tokio::test]
    async fn test_concurrent_checks_never_under_count() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 300,
        });

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check("login:raced@example.com").await.allowed
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 5);
    }
}
