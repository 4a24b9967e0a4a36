//! Error types for labelcache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// Result type alias for labelcache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in labelcache
#[derive(Error, Debug)]
pub enum CacheError {
    // Backend errors
    #[error("Cache directory unavailable: {path}: {source}")]
    BackendUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store object: {reason}")]
    WriteFailed {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Object body not available for {filename}: {reason}")]
    NotAvailable { filename: String, reason: String },

    #[error("Malformed object file {filename}: {reason}")]
    MalformedFile { filename: String, reason: String },

    #[error("Sandbox rejected rule: {0}")]
    SandboxRejected(String),

    // Contract violations
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("No entry with {key}={value}")]
    EntryNotFound { key: String, value: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a write failure caused by an IO error
    pub fn write_failed(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Create a write failure with no underlying IO error
    pub fn write_rejected(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
            source: None,
        }
    }

    /// Report a broken internal contract and return it as an error.
    ///
    /// The violation is logged here, at the point of detection, so callers
    /// that degrade to a no-op still leave a trace.
    pub fn integrity(message: impl Into<String>) -> Self {
        let message = message.into();
        error!("integrity violation: {}", message);
        Self::IntegrityViolation(message)
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailed { .. } | Self::NotAvailable { .. })
    }

    /// Check if error reports a broken refcount or handle contract
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::BackendUnavailable { .. } => {
                Some("Check that the cache directory is writable, or pass --dir")
            }
            Self::WriteFailed { source: None, .. } => {
                Some("Remove unused entries or raise cache.capacity_hint")
            }
            Self::ConfigInvalid { .. } => Some("Run: labelcache config init --force"),
            _ => None,
        }
    }
}
