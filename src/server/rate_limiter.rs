use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const MAX_TRACKED_CLIENTS: usize = 10_000;
const IDLE_EVICTION: Duration = Duration::from_secs(600);
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn take(&mut self, now: Instant, capacity: f64, refill_per_sec: f64) -> Result<(), u64> {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - self.tokens) / refill_per_sec;
            Err(wait.ceil().max(1.0) as u64)
        }
    }
}

struct Buckets {
    clients: HashMap<String, Bucket>,
    /// Shared by clients first seen while the table is full.
    overflow: Bucket,
    last_sweep: Option<Instant>,
}

/// Per-client token buckets. At most `MAX_TRACKED_CLIENTS` clients get their
/// own bucket; idle ones are swept at most once per `SWEEP_INTERVAL`.
pub struct RateLimiter {
    buckets: Mutex<Buckets>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.capacity.max(1));
        Self {
            buckets: Mutex::new(Buckets {
                clients: HashMap::new(),
                overflow: Bucket {
                    tokens: capacity,
                    last_refill: Instant::now(),
                },
                last_sweep: None,
            }),
            capacity,
            refill_per_sec: config.refill_per_sec,
        }
    }

    /// Takes a token for `key`, or returns how many whole seconds until one
    /// is available.
    pub async fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut guard = self.buckets.lock().await;
        let buckets = &mut *guard;

        if !buckets.clients.contains_key(key) && buckets.clients.len() >= MAX_TRACKED_CLIENTS {
            let due = buckets
                .last_sweep
                .is_none_or(|at| now.saturating_duration_since(at) >= SWEEP_INTERVAL);
            if due {
                buckets.last_sweep = Some(now);
                buckets
                    .clients
                    .retain(|_, b| now.saturating_duration_since(b.last_refill) < IDLE_EVICTION);
            }
            if buckets.clients.len() >= MAX_TRACKED_CLIENTS {
                return buckets.overflow.take(now, self.capacity, self.refill_per_sec);
            }
        }

        let capacity = self.capacity;
        buckets
            .clients
            .entry(key.to_string())
            .or_insert_with(|| Bucket {
                tokens: capacity,
                last_refill: now,
            })
            .take(now, capacity, self.refill_per_sec)
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.clients.len()
    }
}
