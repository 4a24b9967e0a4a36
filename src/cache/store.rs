//! The cache: membership, lookup, refcounting and sweeps

use super::arena::{EntryArena, EntryId};
use super::clock::{Clock, SystemClock};
use super::entry::CacheEntry;
use super::handle::{CacheId, WeakEntry};
use super::refcount::Liveness;
use crate::error::{CacheError, CacheResult};
use crate::storage::{Backend, Body, Labels, SandboxConfig, StorageDir};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Upper bound on slots reserved up front; the capacity hint can be huge
const PREALLOC_LIMIT: usize = 1024;

/// Outcome of a sweep over the cache's entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries whose body mapping was dropped
    pub unmapped: usize,
    /// Entries removed from the collection and the backend
    pub deleted: usize,
    /// Entries marked for removal but kept because someone holds them
    pub retained: usize,
    /// Entries dropped from the collection whose file could not be unlinked
    pub failed_removals: usize,
    /// Entries skipped because their bookkeeping was inconsistent
    pub violations: usize,
}

impl SweepReport {
    fn violation(&mut self, message: String) {
        error!("integrity violation: {}", message);
        self.violations += 1;
    }

    fn merge(self, other: Self) -> Self {
        Self {
            unmapped: self.unmapped + other.unmapped,
            deleted: self.deleted + other.deleted,
            retained: self.retained + other.retained,
            failed_removals: self.failed_removals + other.failed_removals,
            violations: self.violations + other.violations,
        }
    }
}

/// Reference-counted cache of labeled objects kept in a [`Backend`].
///
/// The cache holds one reference to every entry in its collection. Entries
/// returned by [`add`](Self::add) carry a second reference that belongs to
/// the caller and must be released with [`decref`](Self::decref). Lookups
/// never change reference counts.
pub struct Cache<B: Backend = StorageDir> {
    id: CacheId,
    backend: B,
    arena: EntryArena<CacheEntry>,
    /// Collection members, in insertion order
    entries: Vec<EntryId>,
    clock: Box<dyn Clock>,
    capacity_hint: usize,
    closed: bool,
}

impl Cache<StorageDir> {
    /// Open (creating if needed) a cache directory sized for about
    /// `capacity_hint` entries, then load every stored entry's labels.
    pub fn open(directory: impl Into<PathBuf>, capacity_hint: usize) -> CacheResult<Self> {
        let backend = StorageDir::open(directory, capacity_hint)?;
        Self::with_backend(backend, capacity_hint)
    }

    /// Bytes used on disk by stored objects
    pub fn usage_bytes(&self) -> CacheResult<u64> {
        self.backend.usage_bytes()
    }
}

impl<B: Backend> Cache<B> {
    /// Build a cache over an already-open backend and rescan it
    pub fn with_backend(backend: B, capacity_hint: usize) -> CacheResult<Self> {
        let mut cache = Self {
            id: CacheId::next(),
            backend,
            arena: EntryArena::with_capacity(capacity_hint.min(PREALLOC_LIMIT)),
            entries: Vec::with_capacity(capacity_hint.min(PREALLOC_LIMIT)),
            clock: Box::new(SystemClock),
            capacity_hint,
            closed: false,
        };
        cache.rescan()?;
        Ok(cache)
    }

    /// Replace the time source used to stamp idle entries
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn id(&self) -> CacheId {
        self.id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Number of entries in the collection, including ones marked for removal
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collection members in order, including ones marked for removal
    pub fn entries(&self) -> &[EntryId] {
        &self.entries
    }

    /// Read-only view of a live entry, attached or not
    pub fn entry(&self, id: EntryId) -> Option<&CacheEntry> {
        self.arena.get(id)
    }

    /// Allow the file operations this cache needs under a sandbox
    pub fn register_with_sandbox(&self, cfg: &mut SandboxConfig) -> CacheResult<()> {
        self.backend.register_with_sandbox(cfg)
    }

    /// Tear the cache down: delete everything marked for removal even if it
    /// is still referenced, then drop the cache's reference to the rest.
    ///
    /// Entries still held elsewhere are not waited for; their ids stop
    /// resolving once the cache is gone.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.clear();
        self.closed = true;
        info!("Closed {}", self.id);
    }

    /// Write `data` to the backend under `labels` and register it.
    ///
    /// The returned entry starts with two references: the collection's and
    /// the caller's.
    pub fn add(&mut self, labels: &Labels, data: &[u8]) -> CacheResult<EntryId> {
        let filename = self
            .backend
            .save_labeled(labels, data)
            .map_err(|e| match e {
                e @ (CacheError::WriteFailed { .. } | CacheError::InvalidArgument(_)) => e,
                other => CacheError::write_rejected(other.to_string()),
            })?;

        let entry = CacheEntry::new(filename, labels.clone(), 2, self.id);
        let id = self.arena.insert(entry);
        self.entries.push(id);
        debug!("Added entry {} ({} bytes, labels {})", id, data.len(), labels);
        Ok(id)
    }

    /// First entry not marked for removal with `key` = `value`
    pub fn find_first(&self, key: &str, value: &str) -> Option<EntryId> {
        self.live_entries()
            .find(|(_, entry)| entry.labels.matches(key, value))
            .map(|(id, _)| id)
    }

    /// Every entry not marked for removal with `key` = `value`, or every
    /// such entry when `key` is `None`
    pub fn find_all(&self, key: Option<&str>, value: &str) -> Vec<EntryId> {
        self.live_entries()
            .filter(|(_, entry)| key.map_or(true, |k| entry.labels.matches(k, value)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Drop from `list` every entry that lacks `key` = `value`.
    ///
    /// Removal marks are not consulted. With no key, `list` is untouched.
    pub fn filter(&self, list: &mut Vec<EntryId>, key: Option<&str>, value: &str) {
        let Some(key) = key else { return };
        list.retain(|id| {
            self.arena
                .get(*id)
                .is_some_and(|entry| entry.labels.matches(key, value))
        });
    }

    /// Label value on a live entry
    pub fn label(&self, id: EntryId, key: &str) -> Option<&str> {
        self.arena.get(id).and_then(|entry| entry.label(key))
    }

    fn live_entries(&self) -> impl Iterator<Item = (EntryId, &CacheEntry)> + '_ {
        self.entries.iter().filter_map(|id| {
            self.arena
                .get(*id)
                .filter(|entry| !entry.can_remove)
                .map(|entry| (*id, entry))
        })
    }

    fn live_mut(&mut self, id: EntryId, op: &str) -> CacheResult<&mut CacheEntry> {
        self.arena
            .get_mut(id)
            .ok_or_else(|| CacheError::integrity(format!("{} on freed entry {}", op, id)))
    }

    /// Take a reference to an entry; it stops counting as idle
    pub fn incref(&mut self, id: EntryId) -> CacheResult<u32> {
        let entry = self.live_mut(id, "incref")?;
        let count = entry.refcount.increment()?;
        entry.unused_since = None;
        Ok(count)
    }

    /// Release a reference.
    ///
    /// When the cache becomes the sole holder of a mapped entry, the entry
    /// is unmapped right away if marked for aggressive release, otherwise
    /// its idle clock starts. The last release frees the entry and every
    /// weak handle to it stops resolving.
    pub fn decref(&mut self, id: EntryId) -> CacheResult<Liveness> {
        let now = self.clock.now();
        let entry = self.live_mut(id, "decref")?;

        if entry.refcount.get() == 1 && entry.is_attached() {
            return Err(CacheError::integrity(format!(
                "decref would free {} while the cache still holds it",
                id
            )));
        }

        match entry.refcount.decrement()? {
            Liveness::Alive(1) if entry.is_attached() => {
                if entry.is_mapped() {
                    if entry.release_aggressively {
                        entry.unmap();
                        debug!("Released mapping of {}", id);
                    } else {
                        entry.unused_since = Some(now);
                    }
                }
                Ok(Liveness::Alive(1))
            }
            Liveness::Alive(count) => Ok(Liveness::Alive(count)),
            Liveness::Destroyed => {
                // Dropping the entry releases its mapping, filename and
                // labels; the generation bump invalidates weak handles.
                self.arena.remove(id);
                debug!("Freed entry {}", id);
                Ok(Liveness::Destroyed)
            }
        }
    }

    /// Mark an entry for deletion once the cache is its only holder
    pub fn mark_for_removal(&mut self, id: EntryId) -> CacheResult<()> {
        self.live_mut(id, "mark_for_removal")?.can_remove = true;
        Ok(())
    }

    /// Unmap an entry as soon as it is no longer in use
    pub fn mark_for_aggressive_release(&mut self, id: EntryId) -> CacheResult<()> {
        self.live_mut(id, "mark_for_aggressive_release")?
            .release_aggressively = true;
        Ok(())
    }

    /// Body of an entry, mapping it from the backend if needed.
    ///
    /// Detached entries can only return a mapping they already have.
    pub fn get_body(&mut self, id: EntryId) -> CacheResult<Body> {
        let cache_id = self.id;
        let entry = self
            .arena
            .get_mut(id)
            .ok_or_else(|| CacheError::integrity(format!("get_body on freed entry {}", id)))?;

        if let Some(body) = &entry.mapping {
            return Ok(body.clone());
        }

        if entry.owner != Some(cache_id) {
            return Err(CacheError::NotAvailable {
                filename: entry.filename.clone(),
                reason: "entry is detached from the cache".to_string(),
            });
        }

        let body = self
            .backend
            .map_body(&entry.filename)
            .map_err(|e| CacheError::NotAvailable {
                filename: entry.filename.clone(),
                reason: e.to_string(),
            })?;

        entry.mapping = Some(body.clone());
        entry.unused_since = None;
        debug!("Mapped {} ({} bytes)", id, body.len());
        Ok(body)
    }

    /// Weak handle to a live entry
    pub fn weak_handle(&self, id: EntryId) -> Option<WeakEntry> {
        self.arena.contains(id).then_some(WeakEntry {
            cache: self.id,
            id,
        })
    }

    /// Resolve a weak handle, if its entry still exists in this cache
    pub fn resolve(&self, weak: &WeakEntry) -> Option<EntryId> {
        (weak.cache == self.id && self.arena.contains(weak.id)).then_some(weak.id)
    }

    /// Unmap every entry that only the cache holds and that has been idle
    /// since `cutoff` or earlier. Never deletes anything.
    pub fn unmap_lazy(&mut self, cutoff: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for id in &self.entries {
            let Some(entry) = self.arena.get_mut(*id) else {
                report.violation(format!("collection holds freed entry {}", id));
                continue;
            };
            if entry.refcount.get() > 1 {
                continue;
            }
            if entry.owner != Some(self.id) {
                report.violation(format!("entry {} is listed but not owned", id));
                continue;
            }
            if !entry.unused_since.is_some_and(|since| since <= cutoff) {
                continue;
            }
            if !entry.is_mapped() {
                continue;
            }
            entry.unmap();
            report.unmapped += 1;
        }

        if report.unmapped > 0 {
            info!("Unmapped {} idle entries", report.unmapped);
        }
        report
    }

    /// Delete every entry marked for removal.
    ///
    /// Without `force`, entries that anyone besides the cache still holds
    /// are kept for a later sweep. With `force`, they are detached and their
    /// files deleted anyway; holders keep a detached entry that can no
    /// longer be mapped.
    pub fn delete_pending(&mut self, force: bool) -> SweepReport {
        let mut report = SweepReport::default();
        let mut doomed = Vec::new();

        for id in &self.entries {
            let Some(entry) = self.arena.get(*id) else {
                report.violation(format!("collection holds freed entry {}", id));
                continue;
            };
            if !force {
                if entry.refcount.get() > 1 {
                    if entry.can_remove {
                        report.retained += 1;
                    }
                    continue;
                }
                if entry.owner != Some(self.id) {
                    report.violation(format!("entry {} is listed but not owned", id));
                    continue;
                }
            }
            if !entry.can_remove {
                continue;
            }
            if entry.refcount.get() == 0 {
                report.violation(format!("entry {} is listed with no references", id));
                continue;
            }
            doomed.push(*id);
        }

        self.entries.retain(|id| !doomed.contains(id));

        for id in doomed {
            let Some(entry) = self.arena.get_mut(id) else {
                continue;
            };
            entry.owner = None;
            let filename = entry.filename.clone();

            if self.decref(id).is_err() {
                report.violations += 1;
            }

            match self.backend.remove_file(&filename) {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("Unable to remove {} from cache: {}", filename, e);
                    report.failed_removals += 1;
                }
            }
        }

        if report.deleted > 0 {
            info!("Deleted {} entries marked for removal", report.deleted);
        }
        report
    }

    /// Periodic housekeeping: unmap entries idle for longer than
    /// `max_idle`, then delete unreferenced entries marked for removal.
    pub fn sweep(&mut self, max_idle: Duration) -> SweepReport {
        let cutoff = self.clock.now() - max_idle;
        let unmapped = self.unmap_lazy(cutoff);
        unmapped.merge(self.delete_pending(false))
    }

    /// Drop the whole collection, keeping the backend open
    fn clear(&mut self) {
        self.delete_pending(true);

        for id in std::mem::take(&mut self.entries) {
            if let Some(entry) = self.arena.get_mut(id) {
                entry.owner = None;
            }
            // Violations are logged where they are detected
            let _ = self.decref(id);
        }
    }

    /// Rebuild the collection from the backend's file listing.
    ///
    /// Only labels are kept; bodies are mapped again on demand. Files that
    /// cannot be mapped are skipped.
    fn rescan(&mut self) -> CacheResult<()> {
        self.clear();

        for filename in self.backend.list_files()? {
            let mapped = match self.backend.map_labeled(&filename) {
                Ok(mapped) => mapped,
                Err(e) => {
                    warn!("Unable to map file {} from cache: {}", filename, e);
                    continue;
                }
            };
            let entry = CacheEntry::new(filename, mapped.labels, 1, self.id);
            let id = self.arena.insert(entry);
            self.entries.push(id);
        }

        info!("Loaded {} entries into {}", self.entries.len(), self.id);
        Ok(())
    }
}

impl<B: Backend> Drop for Cache<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
