//! Non-owning references to cache entries

use super::arena::EntryId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Cache`](super::Cache) instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheId(u64);

impl CacheId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache-{}", self.0)
    }
}

/// Weak reference to an entry.
///
/// Holding one keeps nothing alive. Resolve it through
/// [`Cache::resolve`](super::Cache::resolve), which fails once the entry
/// has been freed or when asked of a different cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakEntry {
    pub(crate) cache: CacheId,
    pub(crate) id: EntryId,
}

impl WeakEntry {
    pub fn cache(&self) -> CacheId {
        self.cache
    }
}
