//! Bounded response cache with per-entry expiry.
//!
//! Expiry is lazy: an entry read after its deadline is treated as absent and
//! removed on that read. There is no background sweep.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
    touched_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Serialized upstream responses keyed by credential fingerprint and request.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), capacity: capacity.max(1) }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(key)?;
        if !entry.is_expired(now) {
            entry.touched_at = now;
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub fn set_at(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration, now: Instant) {
        let key = key.into();
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            Self::make_room(&mut entries, self.capacity, now);
        }
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        entries.insert(key, CacheEntry { value: value.into(), expires_at, touched_at: now });
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries; if still full, drop the least recently touched.
    fn make_room(entries: &mut HashMap<String, CacheEntry>, capacity: usize, now: Instant) {
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        if entries.len() < capacity {
            tracing::debug!("[Cache] Evicted {} expired entries", before - entries.len());
            return;
        }
        let oldest = entries.iter().min_by_key(|(_, e)| e.touched_at).map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            entries.remove(&key);
            tracing::debug!("[Cache] Evicted least recently used entry");
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Key for a cached model listing.
pub fn models_key(fingerprint: &str) -> String {
    format!("models:{}", fingerprint)
}

/// Key for a cached embeddings response. The body is used as sent, not
/// canonicalized, so reordered JSON fields miss the cache.
pub fn embeddings_key(fingerprint: &str, raw_body: &str) -> String {
    format!("embeddings:{}:{}", fingerprint, raw_body)
}
