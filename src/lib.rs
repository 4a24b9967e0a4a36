//! labelcache - disk-backed cache of labeled objects
//!
//! Stores immutable blobs, each tagged with an ordered list of key/value
//! labels, as one file per object in a private directory. Lookups are by
//! label; bodies are memory-mapped on demand and shared by reference count.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
pub mod ui;

pub use cache::{Cache, EntryId};
pub use error::{CacheError, CacheResult};
pub use storage::{Body, Labels, StorageDir};
