//! File-operation allowlist for restricted execution environments

use crate::error::{CacheError, CacheResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// File operation a sandbox rule permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOp {
    Open,
    Stat,
    Rename,
    Unlink,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Stat => "stat",
            Self::Rename => "rename",
            Self::Unlink => "unlink",
        };
        write!(f, "{}", name)
    }
}

/// A single permitted operation on a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRule {
    pub op: FileOp,
    pub path: PathBuf,
    /// Destination path, for renames
    pub target: Option<PathBuf>,
}

/// Collected allowlist that a sandbox is later built from
#[derive(Debug, Clone, Default)]
pub struct SandboxConfig {
    rules: Vec<SandboxRule>,
    max_rules: Option<usize>,
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that refuses rules past `max_rules`
    pub fn with_limit(max_rules: usize) -> Self {
        Self {
            rules: Vec::new(),
            max_rules: Some(max_rules),
        }
    }

    /// Permit `op` on `path`
    pub fn allow(&mut self, op: FileOp, path: &Path) -> CacheResult<()> {
        self.push(SandboxRule {
            op,
            path: path.to_path_buf(),
            target: None,
        })
    }

    /// Permit renaming `from` to `to`
    pub fn allow_rename(&mut self, from: &Path, to: &Path) -> CacheResult<()> {
        self.push(SandboxRule {
            op: FileOp::Rename,
            path: from.to_path_buf(),
            target: Some(to.to_path_buf()),
        })
    }

    fn push(&mut self, rule: SandboxRule) -> CacheResult<()> {
        if self.max_rules.is_some_and(|max| self.rules.len() >= max) {
            return Err(CacheError::SandboxRejected(format!(
                "{} {}: rule limit reached",
                rule.op,
                rule.path.display()
            )));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// True if some rule permits `op` on `path`
    pub fn permits(&self, op: FileOp, path: &Path) -> bool {
        self.rules.iter().any(|r| r.op == op && r.path == path)
    }

    pub fn rules(&self) -> &[SandboxRule] {
        &self.rules
    }
}
