use std::{num::NonZeroU32, time::Duration};

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Per-user GCRA limiter keyed by user id. Rejected attempts do not consume quota.
pub struct UserRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl UserRateLimiter {
    /// One event per `interval`, no burst.
    pub fn one_per(interval: Duration) -> Self {
        let quota = Quota::with_period(interval).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
        Self::with_quota(quota)
    }

    pub fn per_minute(events: u32) -> Self {
        let events = NonZeroU32::new(events).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(Quota::per_minute(events))
    }

    fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// `true` if the user may proceed now.
    pub fn check(&self, user_id: &str) -> bool {
        self.limiter.check_key(&user_id.to_string()).is_ok()
    }

    /// Drops state for users whose window has fully elapsed.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_users(&self) -> usize {
        self.limiter.len()
    }
}
