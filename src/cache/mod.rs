//! Reference-counted cache of labeled objects
//!
//! Entries are loaded lazily: opening a cache reads only labels, and bodies
//! are memory-mapped the first time someone asks for them.
//!
//! # Entry lifecycle
//!
//! | Event | Refcount | Mapping |
//! |-------|----------|---------|
//! | Loaded by rescan | 1 (cache) | unmapped |
//! | Returned by `add` | 2 (cache + caller) | unmapped |
//! | `get_body` | unchanged | mapped |
//! | Last external `decref` | 1 | kept, idle clock starts (or dropped if aggressive) |
//! | `unmap_lazy` past cutoff | 1 | unmapped |
//! | `delete_pending` on marked entry | 0, freed | file deleted |

mod arena;
mod clock;
mod entry;
mod handle;
mod refcount;
mod store;

pub use arena::EntryId;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use handle::{CacheId, WeakEntry};
pub use refcount::{Liveness, RefCount};
pub use store::{Cache, SweepReport};
