//! Login attempt rate limiting.
//!
//! Keyed per credential (lowercased email), so one brute-forced account does
//! not lock out unrelated users. The limiter is a plain injected component;
//! the HTTP layer decides where to apply it.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};

pub struct LoginRateLimiter {
    limiter: RateLimiter<String, DashMapStateStore<String>, DefaultClock>,
}

impl LoginRateLimiter {
    /// Allow `attempts` login attempts per credential within `window`.
    pub fn new(attempts: u32, window: Duration) -> Self {
        let attempts = NonZeroU32::new(attempts.max(1)).unwrap_or(NonZeroU32::MIN);
        let period = window / attempts.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_minute(attempts))
            .allow_burst(attempts);

        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Default policy: 5 attempts per credential per minute.
    pub fn default_policy() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    /// Returns `false` when the credential has exhausted its attempts.
    pub fn check(&self, credential: &str) -> bool {
        self.limiter.check_key(&credential.to_lowercase()).is_ok()
    }
}
