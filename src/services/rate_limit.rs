//! Fixed-window per-client rate limiter.
//!
//! Each client gets a counter that resets once the current window has
//! elapsed. Because windows are fixed rather than sliding, a client can
//! burst up to twice the limit across a window boundary.
//!
//! Client records are never evicted, so memory grows with the number of
//! distinct clients seen over the process lifetime.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::helpers::duration_secs_saturating;
use crate::services::clock::Clock;

#[derive(Debug, Clone, Copy)]
struct RateRecord {
    count: u32,
    window_start: DateTime<Utc>,
}

pub struct RateLimiter {
    records: Mutex<HashMap<String, RateRecord>>,
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(limit: u32, window_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            limit,
            window: duration_secs_saturating(window_secs),
            clock,
        }
    }

    /// Record a request from `client_id` and report whether it may proceed.
    ///
    /// Denied requests do not count against the client.
    pub async fn allow(&self, client_id: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.records.lock().await;

        let Some(record) = records.get_mut(client_id) else {
            records.insert(
                client_id.to_string(),
                RateRecord {
                    count: 1,
                    window_start: now,
                },
            );
            return true;
        };

        if now - record.window_start > self.window {
            *record = RateRecord {
                count: 1,
                window_start: now,
            };
            return true;
        }

        if record.count >= self.limit {
            tracing::debug!(
                "Rate limit hit for client {} ({} requests in window)",
                client_id,
                record.count
            );
            return false;
        }

        record.count += 1;
        true
    }

    /// Number of distinct clients with a record.
    pub async fn tracked_clients(&self) -> usize {
        self.records.lock().await.len()
    }

    pub fn window_secs(&self) -> i64 {
        self.window.num_seconds()
    }
}
