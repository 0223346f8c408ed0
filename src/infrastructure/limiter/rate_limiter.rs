use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::sleep;

/// Token bucket with fractional tokens for smooth refill.
#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    fn has_token(&self) -> bool {
        self.tokens + 1e-9 >= 1.0
    }

    fn secs_until_token(&self) -> u64 {
        if self.has_token() || self.refill_per_sec <= 0.0 {
            return 1;
        }
        (((1.0 - self.tokens) / self.refill_per_sec).ceil() as u64).max(1)
    }
}

/// Two-bucket sliding window approximation.
#[derive(Debug)]
struct SlidingWindow {
    window_size: Duration,
    limit: u64,
    current_window_start: Instant,
    current_count: u64,
    prev_count: u64,
}

impl SlidingWindow {
    fn new(window_size: Duration, limit: u64, now: Instant) -> Self {
        Self {
            window_size,
            limit,
            current_window_start: now,
            current_count: 0,
            prev_count: 0,
        }
    }

    fn roll(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.current_window_start);
        if elapsed >= self.window_size * 2 {
            self.prev_count = 0;
            self.current_count = 0;
            self.current_window_start = now;
        } else if elapsed >= self.window_size {
            self.prev_count = self.current_count;
            self.current_count = 0;
            self.current_window_start += self.window_size;
        }
    }

    fn effective(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.current_window_start);
        let weight = (elapsed.as_secs_f64() / self.window_size.as_secs_f64()).min(1.0);
        (self.prev_count as f64) * (1.0 - weight) + (self.current_count as f64)
    }
}

/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u64,
    pub limit: u64,
    /// Seconds the client should wait, only set when rejected.
    pub retry_after: Option<u64>,
}

#[derive(Debug)]
struct HybridLimiter {
    bucket: TokenBucket,
    window: SlidingWindow,
    last_seen: Instant,
}

impl HybridLimiter {
    fn new(limit: u64, window_size: Duration, now: Instant) -> Self {
        let refill_per_sec = limit as f64 / window_size.as_secs_f64();
        Self {
            bucket: TokenBucket::new(limit as f64, refill_per_sec, now),
            window: SlidingWindow::new(window_size, limit, now),
            last_seen: now,
        }
    }

    /// A request passes only when both the bucket and the window have room,
    /// and only then is it charged against both.
    fn check(&mut self, now: Instant) -> RateLimitDecision {
        self.last_seen = now;
        self.bucket.refill(now);
        self.window.roll(now);

        let limit = self.window.limit;
        let effective = self.window.effective(now);

        if self.bucket.has_token() && effective + 1.0 <= limit as f64 + 1e-9 {
            self.bucket.tokens -= 1.0;
            self.window.current_count += 1;

            let window_left = (limit as f64 - effective - 1.0).max(0.0).floor() as u64;
            let bucket_left = self.bucket.tokens.max(0.0).floor() as u64;
            return RateLimitDecision {
                allowed: true,
                remaining: window_left.min(bucket_left),
                limit,
                retry_after: None,
            };
        }

        RateLimitDecision {
            allowed: false,
            remaining: 0,
            limit,
            retry_after: Some(self.bucket.secs_until_token()),
        }
    }
}

type Key = String;

/// Per-key limiter store shared across workers.
#[derive(Clone)]
pub struct RateLimiterStore {
    map: Arc<DashMap<Key, Arc<Mutex<HybridLimiter>>>>,
    limit: u64,
    window_size: Duration,
    idle_ttl: Duration,
}

impl RateLimiterStore {
    pub fn new(limit: u64, window_size: Duration) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            limit,
            window_size,
            idle_ttl: window_size * 2,
        }
    }

    /// `limit` requests per rolling hour.
    pub fn per_hour(limit: u64) -> Self {
        Self::new(limit, Duration::from_secs(60 * 60))
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let limiter = self
            .map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(HybridLimiter::new(self.limit, self.window_size, now))))
            .clone();

        let mut limiter = limiter.lock();
        limiter.check(now)
    }

    pub fn tracked_keys(&self) -> usize {
        self.map.len()
    }

    /// Drops keys idle for longer than two windows.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.map.len();
        let ttl = self.idle_ttl;
        self.map
            .retain(|_, limiter| now.saturating_duration_since(limiter.lock().last_seen) <= ttl);
        before - self.map.len()
    }

    /// Periodically evicts idle keys. Call once from inside the runtime.
    pub fn spawn_eviction(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                sleep(every).await;
                let evicted = store.evict_idle(Instant::now());
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted idle rate limiter keys");
                }
            }
        })
    }
}
