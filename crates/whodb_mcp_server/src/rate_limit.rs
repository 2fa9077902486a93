use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const IDLE_EVICTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { limit: u64, remaining: u64 },
    /// Seconds until the next token becomes available.
    Limited { retry_after_secs: u64 },
}

/// Counters surfaced by `/health`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RateLimitStats {
    #[serde(rename = "activeBuckets")]
    pub active_buckets: usize,
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    pub rejected: u64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    daily_used: u64,
    day: u64,
    last_seen: Instant,
}

struct LimiterState {
    buckets: HashMap<IpAddr, Bucket>,
    total_requests: u64,
    rejected: u64,
}

/// Token bucket per remote IP: refill rate and burst both equal `qps`,
/// with a separate daily cap that rolls over at UTC midnight. Buckets
/// idle for more than 24 hours are evicted during checks. A matching
/// bypass token skips limiting entirely.
pub struct RateLimiter {
    qps: f64,
    daily_limit: u64,
    bypass_token: Option<String>,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(qps: f64, daily_limit: u64, bypass_token: Option<String>) -> Self {
        Self {
            qps: qps.max(0.001),
            daily_limit,
            bypass_token,
            state: Mutex::new(LimiterState {
                buckets: HashMap::new(),
                total_requests: 0,
                rejected: 0,
            }),
        }
    }

    pub fn check(&self, ip: IpAddr, bypass_header: Option<&str>) -> RateDecision {
        if let (Some(token), Some(header)) = (&self.bypass_token, bypass_header) {
            if token == header {
                let mut state = self.state.lock().expect("rate limiter poisoned");
                state.total_requests += 1;
                return RateDecision::Allowed {
                    limit: self.daily_limit,
                    remaining: self.daily_limit,
                };
            }
        }

        let now = Instant::now();
        let today = current_day();
        let mut state = self.state.lock().expect("rate limiter poisoned");
        state.total_requests += 1;

        state
            .buckets
            .retain(|_, bucket| now.duration_since(bucket.last_seen) <= IDLE_EVICTION);

        let qps = self.qps;
        let bucket = state.buckets.entry(ip).or_insert_with(|| Bucket {
            tokens: qps,
            last_refill: now,
            daily_used: 0,
            day: today,
            last_seen: now,
        });

        // Refill up to the burst size, then reset the daily counter on
        // day rollover.
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * qps).min(qps);
        bucket.last_refill = now;
        bucket.last_seen = now;
        if bucket.day != today {
            bucket.day = today;
            bucket.daily_used = 0;
        }

        if bucket.daily_used >= self.daily_limit {
            state.rejected += 1;
            return RateDecision::Limited {
                retry_after_secs: seconds_until_midnight(),
            };
        }

        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            state.rejected += 1;
            return RateDecision::Limited {
                retry_after_secs: (deficit / qps).ceil().max(1.0) as u64,
            };
        }

        bucket.tokens -= 1.0;
        bucket.daily_used += 1;
        let remaining = self.daily_limit - bucket.daily_used;
        RateDecision::Allowed {
            limit: self.daily_limit,
            remaining,
        }
    }

    pub fn stats(&self) -> RateLimitStats {
        let state = self.state.lock().expect("rate limiter poisoned");
        RateLimitStats {
            active_buckets: state.buckets.len(),
            total_requests: state.total_requests,
            rejected: state.rejected,
        }
    }
}

fn current_day() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() / 86_400)
        .unwrap_or(0)
}

fn seconds_until_midnight() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| 86_400 - (d.as_secs() % 86_400))
        .unwrap_or(86_400)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn second_request_within_the_window_is_limited() {
        let limiter = RateLimiter::new(1.0, 100, None);
        assert!(matches!(
            limiter.check(ip(1), None),
            RateDecision::Allowed { .. }
        ));
        let RateDecision::Limited { retry_after_secs } = limiter.check(ip(1), None) else {
            panic!("second request must be limited");
        };
        assert!(retry_after_secs >= 1);
    }

    #[test]
    fn buckets_are_per_ip() {
        let limiter = RateLimiter::new(1.0, 100, None);
        assert!(matches!(
            limiter.check(ip(1), None),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check(ip(2), None),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn matching_bypass_token_skips_limits() {
        let limiter = RateLimiter::new(1.0, 1, Some("secret".to_string()));
        limiter.check(ip(1), None);
        assert!(matches!(
            limiter.check(ip(1), Some("secret")),
            RateDecision::Allowed { .. }
        ));
        // A wrong token gets no special treatment.
        assert!(matches!(
            limiter.check(ip(1), Some("wrong")),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn daily_cap_applies_after_refill() {
        let limiter = RateLimiter::new(1000.0, 2, None);
        assert!(matches!(
            limiter.check(ip(1), None),
            RateDecision::Allowed { remaining: 1, .. }
        ));
        assert!(matches!(
            limiter.check(ip(1), None),
            RateDecision::Allowed { remaining: 0, .. }
        ));
        assert!(matches!(
            limiter.check(ip(1), None),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn stats_count_requests_and_rejections() {
        let limiter = RateLimiter::new(1.0, 100, None);
        limiter.check(ip(1), None);
        limiter.check(ip(1), None);
        let stats = limiter.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.active_buckets, 1);
    }
}
