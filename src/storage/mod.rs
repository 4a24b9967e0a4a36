//! Labeled-object persistence
//!
//! The cache never touches files directly. It talks to a [`Backend`], which
//! stores each object as one file holding a label header and a body.
//! [`StorageDir`] is the directory-backed implementation.

pub mod dir;
pub mod labels;
pub mod sandbox;

pub use dir::StorageDir;
pub use labels::Labels;
pub use sandbox::{FileOp, SandboxConfig, SandboxRule};

use crate::error::CacheResult;
use memmap2::Mmap;
use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

/// Read-only view of an object's body inside a memory mapping.
///
/// Clones share the mapping; the pages stay mapped until the last clone is
/// dropped.
#[derive(Clone)]
pub struct Body {
    map: Arc<Mmap>,
    range: Range<usize>,
}

impl Body {
    pub(crate) fn new(map: Mmap, offset: usize) -> Self {
        let len = map.len();
        Self {
            map: Arc::new(map),
            range: offset.min(len)..len,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl Deref for Body {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Body {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("len", &self.len()).finish()
    }
}

/// A mapped object: its labels plus a view of its body
#[derive(Debug, Clone)]
pub struct MappedFile {
    pub labels: Labels,
    pub body: Body,
}

/// Durable store of labeled blobs, one file per object
pub trait Backend {
    /// Persist `data` under a fresh filename, returning that name
    fn save_labeled(&mut self, labels: &Labels, data: &[u8]) -> CacheResult<String>;

    /// Names of every stored object
    fn list_files(&self) -> CacheResult<Vec<String>>;

    /// Map an object into memory and parse its labels
    fn map_labeled(&self, filename: &str) -> CacheResult<MappedFile>;

    /// Map an object when its labels are already known
    fn map_body(&self, filename: &str) -> CacheResult<Body> {
        self.map_labeled(filename).map(|mapped| mapped.body)
    }

    /// Delete an object
    fn remove_file(&mut self, filename: &str) -> CacheResult<()>;

    /// Add whatever sandbox rules this backend's file operations require
    fn register_with_sandbox(&self, cfg: &mut SandboxConfig) -> CacheResult<()>;
}
