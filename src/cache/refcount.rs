//! Checked reference counts

use crate::error::{CacheError, CacheResult};

/// What a decrement left behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// References remain
    Alive(u32),
    /// The last reference is gone and the entry has been freed
    Destroyed,
}

impl Liveness {
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

/// Reference count that refuses to wrap in either direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefCount(u32);

impl RefCount {
    pub fn new(initial: u32) -> Self {
        Self(initial)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn increment(&mut self) -> CacheResult<u32> {
        self.0 = self
            .0
            .checked_add(1)
            .ok_or_else(|| CacheError::integrity("reference count overflow"))?;
        Ok(self.0)
    }

    pub fn decrement(&mut self) -> CacheResult<Liveness> {
        if self.0 == 0 {
            return Err(CacheError::integrity("reference count underflow"));
        }
        self.0 -= 1;
        Ok(match self.0 {
            0 => Liveness::Destroyed,
            n => Liveness::Alive(n),
        })
    }
}
