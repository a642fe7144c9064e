//! # Error Types
//!
//! Every fallible operation returns one of the two enums below. Nothing in the
//! crate retries internally: a refused operation is reported to the caller and
//! the caller decides what to do with it.
//!
//! ```text
//!     LimiterError                      RegistryError
//!     ├─ InvalidConfiguration           ├─ KeyAlreadyExists
//!     ├─ InactiveInstance               ├─ KeyNotFound
//!     ├─ AlreadyKilled                  └─ Limiter { key, source: LimiterError }
//!     └─ WorkerSpawn
//! ```

use std::time::Duration;
use thiserror::Error;

/// Errors reported by a single limiter instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    /// `limit` is zero or `size` is below [`MIN_WINDOW_SIZE`](crate::MIN_WINDOW_SIZE).
    ///
    /// The limiter stays unusable until it is rebuilt with a valid configuration.
    #[error("invalid limiter configuration (limit: {limit}, size: {size:?})")]
    InvalidConfiguration {
        /// Configured units per window.
        limit: u64,
        /// Configured window length.
        size: Duration,
    },

    /// The limiter was killed; only a new limiter can serve further calls.
    #[error("should_allow called on an inactive instance")]
    InactiveInstance,

    /// `kill` was called a second time. No state changed.
    #[error("kill called on an already killed limiter")]
    AlreadyKilled,

    /// The background advance thread could not be started.
    #[error("failed to spawn window advance thread: {0}")]
    WorkerSpawn(String),
}

/// Errors reported by a [`KeyRegistry`](crate::KeyRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `create_new_key` was called for a key that already has a limiter.
    #[error("key {0} is already defined")]
    KeyAlreadyExists(String),

    /// The key has no limiter.
    #[error("key {0} not found")]
    KeyNotFound(String),

    /// The limiter bound to `key` refused the operation.
    #[error("limiter for key {key} failed: {source}")]
    Limiter {
        /// Key whose limiter failed.
        key: String,
        /// Underlying limiter error.
        #[source]
        source: LimiterError,
    },
}

impl RegistryError {
    /// Returns the limiter error wrapped by this error, if any.
    pub fn limiter_error(&self) -> Option<&LimiterError> {
        match self {
            Self::Limiter { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_error_messages() {
        let err = LimiterError::InvalidConfiguration {
            limit: 0,
            size: Duration::from_secs(1),
        };
        assert!(err.to_string().contains("invalid limiter configuration"));
        assert!(err.to_string().contains("limit: 0"));

        assert_eq!(
            LimiterError::InactiveInstance.to_string(),
            "should_allow called on an inactive instance"
        );
        assert_eq!(
            LimiterError::AlreadyKilled.to_string(),
            "kill called on an already killed limiter"
        );
    }

    #[test]
    fn test_registry_error_messages() {
        assert_eq!(
            RegistryError::KeyAlreadyExists("/api".into()).to_string(),
            "key /api is already defined"
        );
        assert_eq!(
            RegistryError::KeyNotFound("noKey".into()).to_string(),
            "key noKey not found"
        );
    }

    #[test]
    fn test_registry_error_source() {
        use std::error::Error as _;

        let err = RegistryError::Limiter {
            key: "user-1".into(),
            source: LimiterError::AlreadyKilled,
        };
        assert_eq!(err.limiter_error(), Some(&LimiterError::AlreadyKilled));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("user-1"));

        assert!(RegistryError::KeyNotFound("x".into()).limiter_error().is_none());
    }
}
