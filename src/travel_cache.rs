//! Process-lifetime, TTL-evicting cache in front of a `TravelTimeOracle`.
//! Injectable and independent of any particular oracle implementation;
//! shared across passes in a cycle and across cycles for the life of the
//! process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::domain::RoundedCoordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    origin: (i64, i64),
    destination: (i64, i64),
}

struct Entry {
    seconds: i64,
    inserted_at: Instant,
}

pub struct TravelTimeCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl TravelTimeCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub async fn get(&self, origin: RoundedCoordinate, destination: RoundedCoordinate) -> Option<i64> {
        let key = CacheKey { origin: origin.0.rounded_key(), destination: destination.0.rounded_key() };
        let entries = self.entries.lock().await;
        entries.get(&key).and_then(|entry| {
            if entry.inserted_at.elapsed() < self.ttl {
                Some(entry.seconds)
            } else {
                None
            }
        })
    }

    pub async fn insert(&self, origin: RoundedCoordinate, destination: RoundedCoordinate, seconds: i64) {
        let key = CacheKey { origin: origin.0.rounded_key(), destination: destination.0.rounded_key() };
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        entries.insert(key, Entry { seconds, inserted_at: Instant::now() });
    }
}
