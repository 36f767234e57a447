//! TTL cache for analyzer and model-inference results.
//!
//! Entries expire a fixed time after they are written. When the cache is full
//! the entry closest to expiry is evicted, so the store stays bounded no matter
//! how many distinct inputs arrive.

mod ttl;

pub use ttl::{cache_key, CacheStats, TtlCache, MAX_TTL};
