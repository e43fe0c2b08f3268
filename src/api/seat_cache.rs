//! Short-lived per-event cache for provider seat listings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CachedSeats {
    seats: Vec<String>,
    expires_at: Instant,
}

/// Keyed cache of seat listings with an expiry instant per entry.
///
/// Entries are dropped lazily: an expired entry is treated as a miss and
/// replaced on the next store.
#[derive(Debug, Clone)]
pub struct SeatCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedSeats>>>,
}

impl SeatCache {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the cached seats for `event_id` if still fresh.
    pub async fn get(&self, event_id: &str) -> Option<Vec<String>> {
        self.get_at(event_id, Instant::now()).await
    }

    /// Stores `seats` for `event_id`.
    pub async fn put(&self, event_id: &str, seats: Vec<String>) {
        self.put_at(event_id, seats, Instant::now()).await;
    }

    /// Drops the entry for `event_id`, if any.
    pub async fn invalidate(&self, event_id: &str) {
        self.entries.write().await.remove(event_id);
    }

    async fn get_at(&self, event_id: &str, now: Instant) -> Option<Vec<String>> {
        let entries = self.entries.read().await;
        entries
            .get(event_id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.seats.clone())
    }

    async fn put_at(&self, event_id: &str, seats: Vec<String>, now: Instant) {
        let Some(expires_at) = now.checked_add(self.ttl) else {
            return;
        };
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(event_id.to_string(), CachedSeats { seats, expires_at });
    }
}
