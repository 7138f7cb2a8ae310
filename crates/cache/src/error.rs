//! Error types for the refresh-ahead cache
//!
//! The cache surfaces exactly one runtime failure to callers:
//! [`CacheError::SourceFailure`], raised when a key has never been cached and
//! the source could not produce it. Once any value exists for a key, source
//! failures are absorbed (the stale value is served and the failure observer
//! is notified) and never reach the caller.
//!
//! The remaining variants cover construction: invalid parameters and a
//! refresh worker pool that could not be started.
//!
//! All errors implement [`ErrorClassification`] so callers can route them to
//! retry logic and alerting the same way for every variant.

use std::fmt;

use thiserror::Error;

/// Opaque error produced by a source lookup
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Standard result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors produced by the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The source failed for a key with no cached fallback
    #[error("source failed to fetch key '{key}': {source}")]
    SourceFailure {
        /// Debug rendering of the key that was requested
        key: String,
        /// Error returned by the source
        #[source]
        source: BoxedError,
    },

    /// Cache parameters or settings were rejected
    #[error("invalid cache configuration for '{field}': {message}")]
    InvalidConfig {
        /// Offending parameter name
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// The background refresh pool could not be started
    #[error("failed to start refresh workers: {0}")]
    Executor(#[from] std::io::Error),
}

impl CacheError {
    /// Wrap a source error with the key it was fetching
    pub fn source_failure<K: fmt::Debug>(key: &K, source: BoxedError) -> Self {
        Self::SourceFailure { key: format!("{key:?}"), source }
    }

    /// Create a configuration error for a specific field
    pub fn invalid_config<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::InvalidConfig { field: field.into(), message: message.into() }
    }

    /// Key rendering carried by a [`CacheError::SourceFailure`]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::SourceFailure { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Classification of errors for retry and alerting decisions
pub trait ErrorClassification {
    /// Whether repeating the operation may succeed
    fn is_retryable(&self) -> bool;

    /// Severity used for monitoring and log levels
    fn severity(&self) -> ErrorSeverity;

    /// Whether the error requires immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// Immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for CacheError {
    fn is_retryable(&self) -> bool {
        // A later get() re-runs the source; nothing about the failed attempt
        // is remembered.
        matches!(self, Self::SourceFailure { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::SourceFailure { .. } => ErrorSeverity::Warning,
            Self::InvalidConfig { .. } => ErrorSeverity::Error,
            Self::Executor(_) => ErrorSeverity::Critical,
        }
    }
}
