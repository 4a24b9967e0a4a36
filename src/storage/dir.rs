//! Directory of numbered, labeled object files
//!
//! Objects are named `0`, `1`, ... up to the directory's file limit, always
//! taking the lowest free number. Keeping the name space bounded means every
//! path the directory may ever touch can be listed up front for a sandbox.

use super::{Backend, Body, FileOp, Labels, MappedFile, SandboxConfig};
use super::labels::HEADER_END;
use crate::error::{CacheError, CacheResult};
use memmap2::Mmap;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TMP_SUFFIX: &str = ".tmp";

/// Labeled-file storage rooted at one directory
#[derive(Debug)]
pub struct StorageDir {
    path: PathBuf,
    max_files: usize,
    /// Slot numbers currently holding a file
    contents: BTreeSet<usize>,
}

impl StorageDir {
    /// Open (creating if needed) the directory at `path`, holding up to
    /// `max_files` objects.
    pub fn open(path: impl Into<PathBuf>, max_files: usize) -> CacheResult<Self> {
        let path = path.into();
        let unavailable = |source| CacheError::BackendUnavailable {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&path).map_err(unavailable)?;

        // Object files may carry anything; keep them private to the owner
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&path, perms).map_err(unavailable)?;
        }

        let meta = fs::metadata(&path).map_err(unavailable)?;
        if !meta.is_dir() {
            return Err(unavailable(std::io::Error::new(
                std::io::ErrorKind::Other,
                "not a directory",
            )));
        }

        let mut dir = Self {
            path,
            max_files,
            contents: BTreeSet::new(),
        };
        dir.rescan()?;
        debug!(
            "Opened storage dir {} ({} files, limit {})",
            dir.path.display(),
            dir.contents.len(),
            max_files
        );
        Ok(dir)
    }

    /// Re-read the directory listing from disk
    pub fn rescan(&mut self) -> CacheResult<()> {
        let entries = fs::read_dir(&self.path).map_err(|e| {
            CacheError::io(format!("reading storage dir {}", self.path.display()), e)
        })?;

        self.contents.clear();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io("reading storage dir entry", e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(TMP_SUFFIX) {
                // Left behind by an interrupted write
                continue;
            }
            if let Some(slot) = parse_slot(name) {
                self.contents.insert(slot);
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn file_count(&self) -> usize {
        self.contents.len()
    }

    /// Total bytes used by stored objects
    pub fn usage_bytes(&self) -> CacheResult<u64> {
        let mut total = 0;
        for slot in &self.contents {
            let path = self.slot_path(*slot);
            match fs::metadata(&path) {
                Ok(meta) => total += meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::io(format!("stat {}", path.display()), e));
                }
            }
        }
        Ok(total)
    }

    fn slot_path(&self, slot: usize) -> PathBuf {
        self.path.join(slot.to_string())
    }

    fn tmp_path(&self, slot: usize) -> PathBuf {
        self.path.join(format!("{}{}", slot, TMP_SUFFIX))
    }

    fn unused_slot(&self) -> Option<usize> {
        (0..self.max_files).find(|slot| !self.contents.contains(slot))
    }

    /// Map an object file and locate the end of its label header
    fn map_slot(&self, filename: &str) -> CacheResult<(Mmap, usize)> {
        let malformed = |reason: &str| CacheError::MalformedFile {
            filename: filename.to_string(),
            reason: reason.to_string(),
        };

        let slot = parse_slot(filename).ok_or_else(|| malformed("not an object filename"))?;
        let path = self.slot_path(slot);

        let file = File::open(&path)
            .map_err(|e| CacheError::io(format!("opening {}", path.display()), e))?;
        // SAFETY: object files are written once through a rename and never
        // modified in place; they are only unlinked, which leaves existing
        // mappings intact.
        let map = unsafe { Mmap::map(&file) }
            .map_err(|e| CacheError::io(format!("mapping {}", path.display()), e))?;

        let header_len = map
            .iter()
            .position(|b| *b == HEADER_END)
            .ok_or_else(|| malformed("label header is not terminated"))?;
        Ok((map, header_len))
    }

    fn write_atomically(&self, slot: usize, header: &[u8], data: &[u8]) -> std::io::Result<()> {
        let tmp = self.tmp_path(slot);
        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(header)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&tmp, self.slot_path(slot))
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

impl Backend for StorageDir {
    fn save_labeled(&mut self, labels: &Labels, data: &[u8]) -> CacheResult<String> {
        let header = labels.encode().map_err(CacheError::InvalidArgument)?;

        let slot = self.unused_slot().ok_or_else(|| {
            CacheError::write_rejected(format!(
                "storage directory {} full ({} files)",
                self.path.display(),
                self.max_files
            ))
        })?;

        self.write_atomically(slot, &header, data).map_err(|e| {
            CacheError::write_failed(format!("writing {}", self.slot_path(slot).display()), e)
        })?;

        self.contents.insert(slot);
        debug!("Stored {} bytes as {}", data.len(), slot);
        Ok(slot.to_string())
    }

    fn list_files(&self) -> CacheResult<Vec<String>> {
        Ok(self.contents.iter().map(|slot| slot.to_string()).collect())
    }

    fn map_labeled(&self, filename: &str) -> CacheResult<MappedFile> {
        let (map, header_len) = self.map_slot(filename)?;
        let labels = Labels::decode(&map[..header_len]).map_err(|reason| {
            CacheError::MalformedFile {
                filename: filename.to_string(),
                reason,
            }
        })?;

        Ok(MappedFile {
            labels,
            body: Body::new(map, header_len + 1),
        })
    }

    fn map_body(&self, filename: &str) -> CacheResult<Body> {
        let (map, header_len) = self.map_slot(filename)?;
        Ok(Body::new(map, header_len + 1))
    }

    fn remove_file(&mut self, filename: &str) -> CacheResult<()> {
        let slot = parse_slot(filename).ok_or_else(|| CacheError::MalformedFile {
            filename: filename.to_string(),
            reason: "not an object filename".to_string(),
        })?;
        let path = self.slot_path(slot);

        self.contents.remove(&slot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Object {} was already gone", path.display());
                Ok(())
            }
            Err(e) => Err(CacheError::io(format!("removing {}", path.display()), e)),
        }
    }

    fn register_with_sandbox(&self, cfg: &mut SandboxConfig) -> CacheResult<()> {
        for slot in 0..self.max_files {
            let path = self.slot_path(slot);
            let tmp = self.tmp_path(slot);

            cfg.allow(FileOp::Open, &path)?;
            cfg.allow(FileOp::Open, &tmp)?;
            cfg.allow(FileOp::Stat, &path)?;
            cfg.allow(FileOp::Stat, &tmp)?;
            cfg.allow(FileOp::Unlink, &path)?;
            cfg.allow(FileOp::Unlink, &tmp)?;
            cfg.allow_rename(&tmp, &path)?;
        }
        Ok(())
    }
}

/// Accept only canonical decimal names (`"7"`, not `"07"` or `"+7"`)
fn parse_slot(name: &str) -> Option<usize> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if name.len() > 1 && name.starts_with('0') {
        return None;
    }
    name.parse().ok()
}
