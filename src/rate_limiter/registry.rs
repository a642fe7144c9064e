//! # Key Registry
//!
//! Maps application-defined string keys (client IDs, endpoints, tenants) to
//! independent limiters. The advance strategy is fixed when the registry is
//! constructed; every key gets its own limiter and its own budget.
//!
//! ## Architecture
//!
//! ```text
//!     "user-1"  ──┐
//!     "user-2"  ──┼──► KeyRegistry ──► Arc<dyn Limiter> per key
//!     "/upload" ──┘         │
//!                           ▼
//!                     ┌──────────────────┐
//!                     │  DashMap         │
//!                     │  ┌────────────┐  │
//!                     │  │ key → lim  │  │  shard lock held for one
//!                     │  │ key → lim  │  │  delegated call at most
//!                     │  └────────────┘  │
//!                     └──────────────────┘
//! ```
//!
//! The map's shard locks guard structure only. A limiter's own decision lock
//! is separate, so keys in different shards never contend.

use super::{
    background::BackgroundLimiter,
    config::{AdvanceStrategy, SlidingWindowConfig},
    core::Limiter,
    error::{LimiterError, RegistryError},
    metrics::LimiterMetrics,
    on_demand::OnDemandLimiter,
    utils::{Clock, SystemClock},
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Registry of per-key sliding-window limiters.
///
/// Cloning is cheap and yields a handle to the same registry.
///
/// ## Example
///
/// ```rust
/// use slidewin::{AdvanceStrategy, KeyRegistry, RegistryError};
/// use std::time::Duration;
///
/// let registry = KeyRegistry::new(AdvanceStrategy::OnDemand);
///
/// registry.create_new_key("user-1", 5, Duration::from_secs(1)).unwrap();
/// assert_eq!(registry.should_allow("user-1", 3), Ok(true));
/// assert_eq!(registry.should_allow("user-1", 3), Ok(false));
///
/// assert!(matches!(
///     registry.should_allow("user-2", 1),
///     Err(RegistryError::KeyNotFound(_))
/// ));
///
/// registry.delete_key("user-1").unwrap();
/// assert!(!registry.has_key("user-1"));
/// ```
#[derive(Clone)]
pub struct KeyRegistry {
    /// Key to limiter; DashMap shards give concurrent access to distinct keys.
    limiters: Arc<DashMap<String, Arc<dyn Limiter>, ahash::RandomState>>,

    strategy: AdvanceStrategy,

    /// Time source handed to on-demand limiters.
    clock: Arc<dyn Clock>,

    total_created: Arc<AtomicU64>,
    total_deleted: Arc<AtomicU64>,
}

impl KeyRegistry {
    /// Creates an empty registry whose limiters use `strategy`.
    pub fn new(strategy: AdvanceStrategy) -> Self {
        Self::with_clock(strategy, Arc::new(SystemClock::new()))
    }

    /// Creates an empty registry whose on-demand limiters read `clock`.
    ///
    /// Background limiters always follow real time; their worker threads
    /// sleep on it.
    pub fn with_clock(strategy: AdvanceStrategy, clock: Arc<dyn Clock>) -> Self {
        Self {
            limiters: Arc::new(DashMap::with_hasher(ahash::RandomState::new())),
            strategy,
            clock,
            total_created: Arc::new(AtomicU64::new(0)),
            total_deleted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The advance strategy every limiter in this registry uses.
    pub fn strategy(&self) -> AdvanceStrategy {
        self.strategy
    }

    fn build_limiter(&self, config: SlidingWindowConfig) -> Result<Arc<dyn Limiter>, LimiterError> {
        let limiter: Arc<dyn Limiter> = match self.strategy {
            AdvanceStrategy::Background => Arc::new(BackgroundLimiter::try_new(config)?),
            AdvanceStrategy::OnDemand => {
                Arc::new(OnDemandLimiter::with_clock(config, Arc::clone(&self.clock)))
            }
        };
        Ok(limiter)
    }

    /// Returns `true` if `key` has a limiter.
    pub fn has_key(&self, key: &str) -> bool {
        self.limiters.contains_key(key)
    }

    /// Binds a new limiter admitting `limit` units per `size` to `key`.
    ///
    /// The configuration is not validated here; an invalid pair is reported
    /// by every later decision on the key.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::KeyAlreadyExists`] if `key` already has a limiter.
    ///   The existing limiter is left untouched.
    /// - [`RegistryError::Limiter`] if a background limiter's thread could not
    ///   be spawned.
    pub fn create_new_key(&self, key: &str, limit: u64, size: Duration) -> Result<(), RegistryError> {
        match self.limiters.entry(key.to_string()) {
            Entry::Occupied(_) => {
                warn!("Refusing to redefine existing key: {}", key);
                Err(RegistryError::KeyAlreadyExists(key.to_string()))
            }
            Entry::Vacant(vacant) => {
                let limiter = self
                    .build_limiter(SlidingWindowConfig::new(limit, size))
                    .map_err(|source| RegistryError::Limiter {
                        key: key.to_string(),
                        source,
                    })?;
                vacant.insert(limiter);

                let prev = self.total_created.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Created {:?} limiter for key: {} ({} per {:?}, total: {})",
                    self.strategy,
                    key,
                    limit,
                    size,
                    prev + 1
                );
                Ok(())
            }
        }
    }

    /// Returns `true` if `key` exists or was created by this call.
    ///
    /// Never reports an error; a failed creation yields `false`.
    pub fn has_or_create_key(&self, key: &str, limit: u64, size: Duration) -> bool {
        if self.has_key(key) {
            return true;
        }

        match self.create_new_key(key, limit, size) {
            Ok(()) | Err(RegistryError::KeyAlreadyExists(_)) => true,
            Err(_) => false,
        }
    }

    /// Asks the limiter bound to `key` whether `n` units may proceed.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::KeyNotFound`] if `key` has no limiter.
    /// - [`RegistryError::Limiter`] wrapping the limiter's own error.
    pub fn should_allow(&self, key: &str, n: u64) -> Result<bool, RegistryError> {
        let limiter = self
            .limiters
            .get(key)
            .ok_or_else(|| RegistryError::KeyNotFound(key.to_string()))?;

        limiter.should_allow(n).map_err(|source| RegistryError::Limiter {
            key: key.to_string(),
            source,
        })
    }

    /// Convenience decision that never fails.
    ///
    /// If `key` exists, returns `true` only when its limiter allows `n`
    /// units; a limiter error also yields `false`. If `key` is absent, it is
    /// created with `(limit, size)` and the result is whether creation
    /// succeeded. `n` is not charged against the new limiter.
    ///
    /// ```rust
    /// use slidewin::{AdvanceStrategy, KeyRegistry};
    /// use std::time::Duration;
    ///
    /// let registry = KeyRegistry::new(AdvanceStrategy::OnDemand);
    /// let size = Duration::from_secs(1);
    ///
    /// // first call only creates the key
    /// assert!(registry.must_should_allow("api", 50, 10, size));
    /// assert!(registry.must_should_allow("api", 10, 10, size));
    /// assert!(!registry.must_should_allow("api", 1, 10, size));
    /// ```
    pub fn must_should_allow(&self, key: &str, n: u64, limit: u64, size: Duration) -> bool {
        if let Some(limiter) = self.limiters.get(key) {
            return matches!(limiter.should_allow(n), Ok(true));
        }

        self.create_new_key(key, limit, size).is_ok()
    }

    /// Kills the limiter bound to `key` and removes the key.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::KeyNotFound`] if `key` has no limiter.
    /// - [`RegistryError::Limiter`] if the kill failed; the key is kept.
    pub fn delete_key(&self, key: &str) -> Result<(), RegistryError> {
        match self.limiters.entry(key.to_string()) {
            Entry::Vacant(_) => Err(RegistryError::KeyNotFound(key.to_string())),
            Entry::Occupied(occupied) => {
                if let Err(source) = occupied.get().kill() {
                    warn!("Failed to delete key {}: {}", key, source);
                    return Err(RegistryError::Limiter {
                        key: key.to_string(),
                        source,
                    });
                }

                occupied.remove();
                self.total_deleted.fetch_add(1, Ordering::Relaxed);
                debug!("Deleted limiter for key: {}", key);
                Ok(())
            }
        }
    }

    /// Snapshot of the limiter bound to `key`.
    pub fn metrics(&self, key: &str) -> Option<LimiterMetrics> {
        self.limiters.get(key).map(|limiter| limiter.metrics())
    }

    /// Number of keys currently bound.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Returns `true` if no key is bound.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    /// Returns registry statistics.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_keys: self.len(),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_deleted: self.total_deleted.load(Ordering::Relaxed),
            strategy: self.strategy,
        }
    }

    /// Kills every limiter and removes all keys.
    ///
    /// Background workers are joined before this returns.
    pub fn clear(&self) {
        let count = self.limiters.len();
        for entry in self.limiters.iter() {
            // already-killed limiters are removed all the same
            let _ = entry.value().kill();
        }
        self.limiters.clear();
        self.total_deleted.fetch_add(count as u64, Ordering::Relaxed);
        info!("Cleared all {} keys", count);
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new(AdvanceStrategy::default())
    }
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("strategy", &self.strategy)
            .field("active_keys", &self.len())
            .finish()
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Keys currently bound to a limiter.
    pub active_keys: usize,

    /// Keys created since the registry was built.
    pub total_created: u64,

    /// Keys deleted or cleared since the registry was built.
    pub total_deleted: u64,

    /// Advance strategy of every limiter in the registry.
    pub strategy: AdvanceStrategy,
}

impl RegistryStats {
    /// Returns a human-readable summary of the statistics.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slidewin::{AdvanceStrategy, KeyRegistry};
    ///
    /// let registry = KeyRegistry::new(AdvanceStrategy::Background);
    /// println!("{}", registry.stats().summary());
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "Key Registry Stats:\n\
             ├─ Strategy: {:?}\n\
             ├─ Active Keys: {}\n\
             └─ Lifetime:\n\
                ├─ Total Created: {}\n\
                └─ Total Deleted: {}",
            self.strategy, self.active_keys, self.total_created, self.total_deleted
        )
    }
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
