//! Rate limiting middleware
//!
//! This module throttles failed PIN attempts against public check-in links so
//! a PIN cannot be brute-forced. Only failures spend quota; once a key has
//! spent its quota it is locked out, correct PIN or not, until the lockout
//! window passes.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};
use crate::utils::errors::{Result, ShepherdError};

/// Rate limit configuration
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum failures per key per minute
    pub max_per_minute: u32,
    /// How long a key stays locked once its quota is spent
    pub lockout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_minute: 10,
            lockout: Duration::from_secs(60),
        }
    }
}

/// Keyed limiter shared by all request handlers
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    lockouts: Arc<Mutex<HashMap<String, Instant>>>,
    config: RateLimitConfig,
}

impl RateLimitMiddleware {
    /// Create a new RateLimitMiddleware instance
    pub fn new(config: RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.max_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            lockouts: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Consume one attempt for `key`, failing with 429 once the quota is spent
    pub fn check_rate_limit(&self, key: &str) -> Result<()> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => {
                debug!(key = key, "Rate limit check passed");
                Ok(())
            }
            Err(_) => {
                warn!(key = key, limit = self.config.max_per_minute, "Rate limit exceeded");
                Err(ShepherdError::RateLimitExceeded)
            }
        }
    }

    /// Fail with 429 while `key` is locked out
    pub fn ensure_unlocked(&self, key: &str) -> Result<()> {
        let mut lockouts = self.lockouts.lock().map_err(|_| ShepherdError::Internal("rate limit state poisoned".to_string()))?;
        match lockouts.get(key) {
            Some(until) if *until > Instant::now() => Err(ShepherdError::RateLimitExceeded),
            Some(_) => {
                lockouts.remove(key);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Charge a failed attempt to `key`; spending the last of the quota locks it out
    pub fn record_failure(&self, key: &str) -> Result<()> {
        if let Err(err) = self.check_rate_limit(key) {
            let until = Instant::now() + self.config.lockout;
            self.lockouts
                .lock()
                .map_err(|_| ShepherdError::Internal("rate limit state poisoned".to_string()))?
                .insert(key.to_string(), until);
            warn!(key = key, lockout_secs = self.config.lockout.as_secs(), "Key locked out after repeated failures");
            return Err(err);
        }
        Ok(())
    }

    /// Drop state for keys whose quota has fully replenished
    pub fn cleanup_old_entries(&self) {
        self.limiter.retain_recent();
        if let Ok(mut lockouts) = self.lockouts.lock() {
            let now = Instant::now();
            lockouts.retain(|_, until| *until > now);
        }
        debug!(remaining_entries = self.limiter.len(), "Cleaned up old rate limit entries");
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }
}

impl Default for RateLimitMiddleware {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(max_per_minute: u32) -> RateLimitMiddleware {
        RateLimitMiddleware::new(RateLimitConfig { max_per_minute, ..Default::default() })
    }

    #[test]
    fn test_rate_limit_basic() {
        let middleware = limited(3);

        assert!(middleware.check_rate_limit("grace-chapel").is_ok());
        assert!(middleware.check_rate_limit("grace-chapel").is_ok());
        assert!(middleware.check_rate_limit("grace-chapel").is_ok());

        let err = middleware.check_rate_limit("grace-chapel").unwrap_err();
        assert!(matches!(err, ShepherdError::RateLimitExceeded));
    }

    #[test]
    fn test_keys_are_independent() {
        let middleware = limited(1);

        assert!(middleware.check_rate_limit("first-baptist").is_ok());
        assert!(middleware.check_rate_limit("first-baptist").is_err());
        assert!(middleware.check_rate_limit("st-marks").is_ok());
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let middleware = limited(0);
        assert!(middleware.check_rate_limit("calvary").is_ok());
    }

    #[test]
    fn test_unlocked_keys_pass_without_spending_quota() {
        let middleware = limited(2);
        for _ in 0..50 {
            assert!(middleware.ensure_unlocked("grace-chapel").is_ok());
        }
        assert!(middleware.record_failure("grace-chapel").is_ok());
    }

    #[test]
    fn test_spent_quota_locks_key_out() {
        let middleware = limited(2);
        assert!(middleware.record_failure("grace-chapel").is_ok());
        assert!(middleware.record_failure("grace-chapel").is_ok());
        assert!(middleware.ensure_unlocked("grace-chapel").is_ok());

        let err = middleware.record_failure("grace-chapel").unwrap_err();
        assert!(matches!(err, ShepherdError::RateLimitExceeded));
        assert!(matches!(middleware.ensure_unlocked("grace-chapel"), Err(ShepherdError::RateLimitExceeded)));
        assert!(middleware.ensure_unlocked("st-marks").is_ok());
    }

    #[test]
    fn test_lockout_expires() {
        let middleware = RateLimitMiddleware::new(RateLimitConfig { max_per_minute: 1, lockout: Duration::ZERO });
        middleware.record_failure("calvary").unwrap();
        assert!(middleware.record_failure("calvary").is_err());
        assert!(middleware.ensure_unlocked("calvary").is_ok());
    }

    #[test]
    fn test_cleanup_keeps_recent_entries() {
        let middleware = RateLimitMiddleware::default();
        middleware.check_rate_limit("calvary").unwrap();
        middleware.cleanup_old_entries();
        assert_eq!(middleware.config().max_per_minute, 10);
    }
}
