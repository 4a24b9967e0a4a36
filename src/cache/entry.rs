//! A single cached object and its lifecycle state

use super::refcount::RefCount;
use super::CacheId;
use crate::storage::{Body, Labels};
use chrono::{DateTime, Utc};

/// Handle to one stored object.
///
/// Fields are only changed through [`Cache`](super::Cache) operations;
/// this type exposes read-only views for callers.
#[derive(Debug)]
pub struct CacheEntry {
    pub(crate) filename: String,
    pub(crate) labels: Labels,
    pub(crate) refcount: RefCount,
    /// Logically deleted; the file goes away at the next sweep that finds
    /// the cache as sole holder
    pub(crate) can_remove: bool,
    /// Unmap as soon as the cache is the only holder again
    pub(crate) release_aggressively: bool,
    /// Cache whose membership list holds this entry
    pub(crate) owner: Option<CacheId>,
    /// `None` means never idle: either someone besides the cache holds a
    /// reference, or nothing is mapped
    pub(crate) unused_since: Option<DateTime<Utc>>,
    pub(crate) mapping: Option<Body>,
}

impl CacheEntry {
    pub(crate) fn new(filename: String, labels: Labels, refcount: u32, owner: CacheId) -> Self {
        Self {
            filename,
            labels,
            refcount: RefCount::new(refcount),
            can_remove: false,
            release_aggressively: false,
            owner: Some(owner),
            unused_since: None,
            mapping: None,
        }
    }

    /// Name of the backing file inside the storage backend
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Value for `key`, first match wins
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key)
    }

    pub fn refcount(&self) -> u32 {
        self.refcount.get()
    }

    pub fn can_remove(&self) -> bool {
        self.can_remove
    }

    pub fn releases_aggressively(&self) -> bool {
        self.release_aggressively
    }

    /// True while the entry is a member of a cache's collection
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    /// Mapped body, if currently mapped
    pub fn body(&self) -> Option<&Body> {
        self.mapping.as_ref()
    }

    pub fn unused_since(&self) -> Option<DateTime<Utc>> {
        self.unused_since
    }

    pub(crate) fn unmap(&mut self) {
        self.mapping = None;
        self.unused_since = None;
    }
}
