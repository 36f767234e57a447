//! Bounded TTL cache shared by concurrent requests.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Longest TTL honored; larger values are clamped so `now + ttl` cannot overflow.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A cached value with its expiry.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    sequence: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries (expired ones not yet purged included).
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Number of hits.
    pub hits: u64,

    /// Number of misses (absent or expired).
    pub misses: u64,

    /// Entries removed to make room.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculates the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Bounded key/value store whose entries expire `ttl` after being written.
///
/// All operations take `&self`; state lives behind a mutex that is held only
/// for the map operation itself, never across an `.await`.
pub struct TtlCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new cache.
    ///
    /// A capacity of zero is clamped to one and `ttl` to [`MAX_TTL`].
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_sequence: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity: capacity.max(1),
            ttl: ttl.min(MAX_TTL),
        }
    }

    /// Time to live applied on every `put`.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up a live entry.
    ///
    /// Returns `None` if absent or expired; an expired entry is removed.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        match inner.entries.get(key).map(|entry| entry.is_expired(now)) {
            None => {
                inner.misses += 1;
                None
            }
            Some(true) => {
                inner.entries.remove(key);
                inner.misses += 1;
                None
            }
            Some(false) => {
                inner.hits += 1;
                inner.entries.get(key).map(|entry| entry.value.clone())
            }
        }
    }

    /// Inserts or overwrites an entry, expiring `ttl` from now.
    pub fn put(&self, key: K, value: V) {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            Self::purge_locked(&mut inner, now);
            while inner.entries.len() >= self.capacity {
                if !Self::evict_earliest(&mut inner) {
                    break;
                }
            }
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
                sequence,
            },
        );
    }

    /// Removes an entry.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().entries.remove(key).map(|e| e.value)
    }

    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        Self::purge_locked(&mut inner, Instant::now())
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    fn purge_locked(inner: &mut Inner<K, V>, now: Instant) -> usize {
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        before - inner.entries.len()
    }

    /// Evicts the entry with the earliest expiry; ties go to the oldest write.
    fn evict_earliest(inner: &mut Inner<K, V>) -> bool {
        let victim = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at, entry.sequence))
            .map(|(key, _)| key.clone());

        match victim {
            Some(key) => {
                inner.entries.remove(&key);
                inner.evictions += 1;
                true
            }
            None => false,
        }
    }
}

/// Builds a stable cache key: SHA-256 over the namespace and parts.
///
/// Every piece is length-prefixed, so `("ab", "c")` and `("a", "bc")` differ.
pub fn cache_key(namespace: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for piece in std::iter::once(namespace).chain(parts.iter().copied()) {
        hasher.update((piece.len() as u64).to_le_bytes());
        hasher.update(piece.as_bytes());
    }
    format!("{}:{}", namespace, hex::encode(hasher.finalize()))
}
