//! # Sliding Window Configuration
//!
//! This module holds the settings that shape a limiter: how many units may
//! pass (`limit`) per window of length `size`, and which window advance
//! strategy a [`KeyRegistry`](crate::KeyRegistry) should build.
//!
//! ```text
//!     limit = 100, size = 1s
//!
//!          previous window        current window
//!     ├──────────────────────┼──────────────────────┤
//!     │      80 units        │  30 units   ▲        │
//!     └──────────────────────┴─────────────┼────────┘
//!                                          now (40% into current)
//!
//!     estimate = floor(80 × 0.6) + 30 = 78  →  22 units still admissible
//! ```
//!
//! Configuration is never rejected at construction time. An invalid pair is
//! carried by the limiter and reported by every decision call as
//! [`LimiterError::InvalidConfiguration`].

use super::error::LimiterError;
use std::time::Duration;

/// Smallest window length a limiter accepts.
///
/// Shorter windows make the interpolation weight noisy and force the
/// background advance thread to wake up continuously.
pub const MIN_WINDOW_SIZE: Duration = Duration::from_millis(1);

/// Window advance strategy used by a [`KeyRegistry`](crate::KeyRegistry).
///
/// ```text
///     Background ──► one thread per limiter slides the windows every `size`
///     OnDemand ────► windows are aligned inside each decision call
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdvanceStrategy {
    /// Windows are promoted by a dedicated thread owned by each limiter.
    ///
    /// Use when decisions must not pay for window bookkeeping, and the
    /// number of keys is small enough that one thread per key is acceptable.
    Background,

    /// Windows are aligned to absolute `size` boundaries during each call.
    ///
    /// No threads are spawned; this is the default.
    #[default]
    OnDemand,
}

/// Rate configuration for a single limiter: `limit` units per `size` window.
///
/// ## Examples
///
/// ```rust
/// use slidewin::SlidingWindowConfig;
/// use std::time::Duration;
///
/// // 100 units per second
/// let config = SlidingWindowConfig::per_second(100);
/// assert!(config.validate().is_ok());
///
/// // 5 units every 250ms
/// let config = SlidingWindowConfig::new(5, Duration::from_millis(250));
/// assert_eq!(config.effective_rate_per_second(), 20.0);
///
/// // Rejected at decision time
/// let config = SlidingWindowConfig::new(0, Duration::from_secs(1));
/// assert!(config.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlidingWindowConfig {
    /// Units admitted per window. Must be greater than 0.
    pub limit: u64,

    /// Window length. Must be at least [`MIN_WINDOW_SIZE`].
    pub size: Duration,
}

impl Default for SlidingWindowConfig {
    /// 100 units per second.
    fn default() -> Self {
        Self::per_second(100)
    }
}

impl SlidingWindowConfig {
    /// Creates a configuration admitting `limit` units per `size`.
    pub fn new(limit: u64, size: Duration) -> Self {
        Self { limit, size }
    }

    /// Creates a configuration admitting `limit` units per second.
    pub fn per_second(limit: u64) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    /// Creates a configuration admitting `limit` units per minute.
    pub fn per_minute(limit: u64) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Checks that `limit > 0` and `size >= MIN_WINDOW_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::InvalidConfiguration`] carrying the offending pair.
    pub fn validate(&self) -> Result<(), LimiterError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(LimiterError::InvalidConfiguration {
                limit: self.limit,
                size: self.size,
            })
        }
    }

    /// Returns `true` when [`validate`](Self::validate) would succeed.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.limit > 0 && self.size >= MIN_WINDOW_SIZE
    }

    /// Window length in nanoseconds, saturating at `u64::MAX`.
    #[inline]
    pub(crate) fn size_ns(&self) -> u64 {
        u64::try_from(self.size.as_nanos()).unwrap_or(u64::MAX)
    }

    /// Long-run admitted units per second for this configuration.
    ///
    /// Returns `0.0` for a zero-length window.
    pub fn effective_rate_per_second(&self) -> f64 {
        let secs = self.size.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.limit as f64 / secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(SlidingWindowConfig::default().validate().is_ok());

        let zero_limit = SlidingWindowConfig::new(0, Duration::from_secs(10));
        assert_eq!(
            zero_limit.validate(),
            Err(LimiterError::InvalidConfiguration {
                limit: 0,
                size: Duration::from_secs(10),
            })
        );

        let tiny_window = SlidingWindowConfig::new(10, Duration::from_micros(800));
        assert!(tiny_window.validate().is_err());
        assert!(!tiny_window.is_valid());

        let exact_min = SlidingWindowConfig::new(1, MIN_WINDOW_SIZE);
        assert!(exact_min.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = SlidingWindowConfig::per_second(100);
        assert_eq!(config.limit, 100);
        assert_eq!(config.size, Duration::from_secs(1));
        assert_eq!(config.effective_rate_per_second(), 100.0);

        let config = SlidingWindowConfig::per_minute(120);
        assert_eq!(config.size, Duration::from_secs(60));
        assert_eq!(config.effective_rate_per_second(), 2.0);
    }

    #[test]
    fn test_size_ns() {
        let config = SlidingWindowConfig::new(1, Duration::from_millis(1500));
        assert_eq!(config.size_ns(), 1_500_000_000);

        let huge = SlidingWindowConfig::new(1, Duration::MAX);
        assert_eq!(huge.size_ns(), u64::MAX);
    }

    #[test]
    fn test_zero_window_rate() {
        let config = SlidingWindowConfig::new(10, Duration::ZERO);
        assert_eq!(config.effective_rate_per_second(), 0.0);
    }

    #[test]
    fn test_default_strategy() {
        assert_eq!(AdvanceStrategy::default(), AdvanceStrategy::OnDemand);
    }
}
