//! Two-tier admission control for the anonymous tier: a per-IP daily quota
//! and a site-wide daily cap that bounds total AI spend.
//!
//! Both are fixed UTC-calendar-day windows keyed by date string, so the reset
//! falls out of the key name plus a TTL. The global cap is consulted before
//! the per-IP quota, and nothing is incremented on a rejection. The
//! read-then-increment sequence is not atomic as a compound, so concurrent
//! requests near the boundary can overshoot the cap by a small margin. The
//! limiter bounds cost, it does not enforce hard correctness.

use std::sync::Arc;
use tracing::warn;

use crate::clock::Clock;
use crate::store::{KvStore, MemoryStore, StoreError};

// Counter keys live for two days so a window never expires mid-day
const DAY_TTL_SECS: i64 = 2 * 24 * 60 * 60;

const GLOBAL_KEY: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub global_cap_hit: bool,
}

pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    // Process-local stand-in used when the remote backend errors mid-call.
    // Not shared across instances, so the effective limit multiplies by
    // instance count.
    fallback: MemoryStore,
    clock: Arc<dyn Clock>,
    free_limit: u32,
    global_limit: u32,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        free_limit: u32,
        global_limit: u32,
    ) -> Self {
        Self {
            store,
            fallback: MemoryStore::new(clock.clone()),
            clock,
            free_limit,
            global_limit,
        }
    }

    pub async fn check(&self, ip: &str) -> RateLimitDecision {
        match self.check_with(self.store.as_ref(), ip).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!("rate limit backend unavailable, using in-memory fallback: {err}");
                self.check_with(&self.fallback, ip)
                    .await
                    .unwrap_or(RateLimitDecision {
                        allowed: true,
                        remaining: self.free_limit,
                        global_cap_hit: false,
                    })
            }
        }
    }

    async fn check_with(
        &self,
        store: &dyn KvStore,
        ip: &str,
    ) -> Result<RateLimitDecision, StoreError> {
        let day = self.clock.now_utc().format("%Y-%m-%d").to_string();
        let global_key = format!("rl:{GLOBAL_KEY}:{day}");
        let ip_key = format!("rl:ip:{ip}:{day}");

        // Global cap first. An exhausted cap rejects everyone and must not
        // consume their per-IP quota.
        let global_used = store.get_count(&global_key).await?;
        if global_used >= u64::from(self.global_limit) {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                global_cap_hit: true,
            });
        }

        let ip_used = store.get_count(&ip_key).await?;
        if ip_used >= u64::from(self.free_limit) {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                global_cap_hit: false,
            });
        }

        // Admit: bump both counters in one pipelined incr+expire
        let counts = store.incr_expire(&[&ip_key, &global_key], DAY_TTL_SECS).await?;
        let ip_count = counts.first().copied().unwrap_or(ip_used + 1);

        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.free_limit.saturating_sub(ip_count as u32),
            global_cap_hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn limiter(free: u32, global: u32) -> (RateLimiter, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let limiter = RateLimiter::new(store.clone(), clock.clone(), free, global);
        (limiter, clock, store)
    }

    #[tokio::test]
    async fn remaining_decreases_monotonically_then_rejects() {
        let (limiter, _clock, _store) = limiter(10, 500);

        for expected_remaining in (0..10).rev() {
            let decision = limiter.check("1.2.3.4").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let eleventh = limiter.check("1.2.3.4").await;
        assert!(!eleventh.allowed);
        assert!(!eleventh.global_cap_hit, "per-IP exhaustion, not global");
        assert_eq!(eleventh.remaining, 0);
    }

    #[tokio::test]
    async fn window_rollover_restarts_the_count() {
        let (limiter, clock, _store) = limiter(2, 500);
        assert!(limiter.check("9.9.9.9").await.allowed);
        assert!(limiter.check("9.9.9.9").await.allowed);
        assert!(!limiter.check("9.9.9.9").await.allowed);

        clock.advance(Duration::days(1));
        let fresh = limiter.check("9.9.9.9").await;
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1); // counter restarted at 1
    }

    #[tokio::test]
    async fn global_cap_rejects_brand_new_identities() {
        let (limiter, _clock, store) = limiter(10, 5);

        for i in 0..5 {
            assert!(limiter.check(&format!("10.0.0.{i}")).await.allowed);
        }

        let decision = limiter.check("203.0.113.7").await;
        assert!(!decision.allowed);
        assert!(decision.global_cap_hit);

        // rejection must not have consumed the newcomer's per-IP quota
        let day = "2026-03-10";
        assert_eq!(
            store
                .get_count(&format!("rl:ip:203.0.113.7:{day}"))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn other_identities_are_independent_below_the_cap() {
        let (limiter, _clock, _store) = limiter(1, 500);
        assert!(limiter.check("1.1.1.1").await.allowed);
        assert!(!limiter.check("1.1.1.1").await.allowed);
        assert!(limiter.check("2.2.2.2").await.allowed);
    }

    #[tokio::test]
    async fn backend_outage_degrades_to_the_memory_fallback() {
        use crate::store::test_support::BrokenStore;


        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap(),
        ));
        let limiter = RateLimiter::new(Arc::new(BrokenStore), clock, 2, 500);

        assert!(limiter.check("1.2.3.4").await.allowed);
        assert!(limiter.check("1.2.3.4").await.allowed);
        // fallback enforces the same windowing logic
        assert!(!limiter.check("1.2.3.4").await.allowed);
    }
}
