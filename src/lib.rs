//! # Slidewin - Sliding Window Rate Limiting for Rust
//!
//! An in-process admission-control primitive: given a rate of `limit` units
//! per `size` window, it decides per call whether `n` more units of work may
//! proceed now.
//!
//! ## The Sliding Window Counter
//!
//! A true sliding log remembers every admitted unit. This crate keeps two
//! counters instead and interpolates between them:
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
//!     estimate = floor(80 × 0.6) + 30 = 78
//! ```
//!
//! Memory and decision cost are O(1) per limiter, at the price of assuming the
//! previous window's traffic was evenly spread.
//!
//! ## Two Ways to Advance Windows
//!
//! - [`BackgroundLimiter`] owns a worker thread that slides its windows every
//!   `size`. Decisions never do bookkeeping.
//! - [`OnDemandLimiter`] slides its windows inside each call, aligned to
//!   absolute `size` boundaries. No threads.
//!
//! Both implement the [`Limiter`] trait.
//!
//! ## Quick Start
//!
//! ### A Single Limiter
//!
//! ```rust
//! use slidewin::{Limiter, OnDemandLimiter, SlidingWindowConfig};
//!
//! // 10 units per second
//! let limiter = OnDemandLimiter::new(SlidingWindowConfig::per_second(10));
//!
//! match limiter.should_allow(1) {
//!     Ok(true) => println!("processing"),
//!     Ok(false) => println!("rate limited, try again later"),
//!     Err(err) => eprintln!("limiter fault: {err}"),
//! }
//! ```
//!
//! ### Builder
//!
//! ```rust
//! use slidewin::{Limiter, SlidingWindowBuilder};
//! use std::time::Duration;
//!
//! let limiter = SlidingWindowBuilder::new()
//!     .limit(500)
//!     .size(Duration::from_secs(60))
//!     .build_background();
//!
//! assert_eq!(limiter.should_allow(5), Ok(true));
//! limiter.kill().unwrap();
//! ```
//!
//! ### Per-Key Limiting
//!
//! ```rust
//! use slidewin::{AdvanceStrategy, KeyRegistry};
//! use std::time::Duration;
//!
//! let registry = KeyRegistry::new(AdvanceStrategy::OnDemand);
//!
//! // first request for a key only registers it
//! let size = Duration::from_secs(1);
//! assert!(registry.must_should_allow("client-42", 1, 10, size));
//! assert!(registry.must_should_allow("client-42", 1, 10, size));
//! ```
//!
//! ## Architecture Overview
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │   Your Application      │
//!                    └──────────┬──────────────┘
//!                               │
//!                    ┌──────────▼──────────────┐
//!                    │      Limiter API        │
//!                    ├─────────────────────────┤
//!                    │  • should_allow(n)      │
//!                    │  • kill()               │
//!                    │  • metrics()            │
//!                    └──────────┬──────────────┘
//!                               │
//!                ┌──────────────┴───────────────┐
//!                │                              │
//!     ┌──────────▼──────────┐       ┌───────────▼──────────┐
//!     │   Limiters          │       │   Key Registry       │
//!     ├─────────────────────┤       ├──────────────────────┤
//!     │ • Background        │       │ • DashMap of keys    │
//!     │ • OnDemand          │       │ • create / delete    │
//!     │ • one Mutex each    │       │ • per-key decisions  │
//!     └─────────────────────┘       └──────────────────────┘
//! ```
//!
//! ## Errors
//!
//! Every fallible operation returns [`LimiterError`] or [`RegistryError`]. A
//! rejected decision is `Ok(false)`, never an error; errors mean a lifecycle
//! or configuration fault. Nothing is retried internally.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (window slides and key lifecycle at
//! `debug`, worker start/stop at `info`, refused operations at `warn`) and
//! never installs a subscriber.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

// Internal module
mod rate_limiter;

// Public re-exports
pub use rate_limiter::{
    current_time_ns, AdvanceStrategy, BackgroundLimiter, Clock, KeyRegistry, Limiter,
    LimiterError, LimiterMetrics, ManualClock, OnDemandLimiter, RegistryError, RegistryStats,
    SlidingWindowConfig, SystemClock, WindowSnapshot, MIN_WINDOW_SIZE,
};

use std::sync::Arc;
use std::time::Duration;

/// A limiter of either variant behind `Arc`, as stored by [`KeyRegistry`].
///
/// # Example
/// ```rust
/// use slidewin::{BackgroundLimiter, OnDemandLimiter, SharedLimiter, SlidingWindowConfig};
/// use std::sync::Arc;
///
/// let config = SlidingWindowConfig::per_second(10);
/// let on_demand: SharedLimiter = Arc::new(OnDemandLimiter::new(config));
/// let background: SharedLimiter = Arc::new(BackgroundLimiter::new(config));
/// let limiters = vec![on_demand, background];
///
/// for limiter in &limiters {
///     assert_eq!(limiter.should_allow(1), Ok(true));
/// }
/// ```
pub type SharedLimiter = Arc<dyn Limiter>;

/// A key registry wrapped in `Arc` for sharing across threads.
pub type SharedRegistry = Arc<KeyRegistry>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum supported Rust version.
pub const MSRV: &str = "1.70.0";

/// Prelude module for convenient imports.
///
/// ```rust
/// use slidewin::prelude::*;
/// ```
pub mod prelude {
    //! Common imports for typical rate limiting use cases.
    //!
    //! # Example
    //! ```rust
    //! use slidewin::prelude::*;
    //!
    //! let limiter = OnDemandLimiter::new(SlidingWindowConfig::per_second(50));
    //! let registry = KeyRegistry::new(AdvanceStrategy::default());
    //! assert!(limiter.should_allow(1).unwrap());
    //! assert!(registry.is_empty());
    //! ```

    pub use crate::{
        AdvanceStrategy, BackgroundLimiter, KeyRegistry, Limiter, LimiterError, LimiterMetrics,
        OnDemandLimiter, RegistryError, SharedLimiter, SharedRegistry, SlidingWindowBuilder,
        SlidingWindowConfig,
    };
}

/// Builder for either limiter variant.
///
/// # Example
///
/// ```rust
/// use slidewin::{Limiter, ManualClock, SlidingWindowBuilder};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// // 100 units per minute, driven by a test clock
/// let clock = ManualClock::new(0);
/// let limiter = SlidingWindowBuilder::new()
///     .limit(100)
///     .size(Duration::from_secs(60))
///     .clock(Arc::new(clock.clone()))
///     .build_on_demand();
/// assert_eq!(limiter.should_allow(100), Ok(true));
///
/// // Or use try_build_*() to reject invalid settings up front
/// let result = SlidingWindowBuilder::new()
///     .limit(0)  // Invalid!
///     .try_build_on_demand();
///
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SlidingWindowBuilder {
    config: SlidingWindowConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl SlidingWindowBuilder {
    /// Creates a builder with the default configuration (100 per second).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the units admitted per window (must be > 0).
    pub fn limit(mut self, limit: u64) -> Self {
        self.config.limit = limit;
        self
    }

    /// Sets the window length (must be at least [`MIN_WINDOW_SIZE`]).
    pub fn size(mut self, size: Duration) -> Self {
        self.config.size = size;
        self
    }

    /// Sets the time source of an on-demand limiter.
    ///
    /// Ignored by [`build_background`](Self::build_background); the worker
    /// thread sleeps on real time.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> SlidingWindowConfig {
        self.config
    }

    /// Builds a [`BackgroundLimiter`].
    ///
    /// An invalid configuration is not rejected here; decisions report it.
    ///
    /// # Panics
    ///
    /// Panics if the advance thread cannot be spawned. Use
    /// [`try_build_background`](Self::try_build_background) to handle errors.
    pub fn build_background(self) -> BackgroundLimiter {
        BackgroundLimiter::new(self.config)
    }

    /// Validates the configuration, then builds a [`BackgroundLimiter`].
    ///
    /// # Errors
    ///
    /// [`LimiterError::InvalidConfiguration`] or [`LimiterError::WorkerSpawn`].
    pub fn try_build_background(self) -> Result<BackgroundLimiter, LimiterError> {
        self.config.validate()?;
        BackgroundLimiter::try_new(self.config)
    }

    /// Builds an [`OnDemandLimiter`].
    ///
    /// An invalid configuration is not rejected here; decisions report it.
    pub fn build_on_demand(self) -> OnDemandLimiter {
        match self.clock {
            Some(clock) => OnDemandLimiter::with_clock(self.config, clock),
            None => OnDemandLimiter::new(self.config),
        }
    }

    /// Validates the configuration, then builds an [`OnDemandLimiter`].
    ///
    /// # Errors
    ///
    /// [`LimiterError::InvalidConfiguration`].
    pub fn try_build_on_demand(self) -> Result<OnDemandLimiter, LimiterError> {
        self.config.validate()?;
        Ok(self.build_on_demand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_functionality() {
        let limiter = OnDemandLimiter::with_clock(
            SlidingWindowConfig::per_minute(10),
            Arc::new(ManualClock::new(0)),
        );

        for _ in 0..10 {
            assert_eq!(limiter.should_allow(1), Ok(true));
        }
        assert_eq!(limiter.should_allow(1), Ok(false));

        let metrics = limiter.metrics();
        assert_eq!(metrics.allowed_units, 10);
        assert_eq!(metrics.rejected_calls, 1);
    }

    #[test]
    fn test_builder() {
        let builder = SlidingWindowBuilder::new()
            .limit(50)
            .size(Duration::from_millis(250));

        assert_eq!(builder.config(), SlidingWindowConfig::new(50, Duration::from_millis(250)));

        let limiter = builder.build_on_demand();
        assert_eq!(limiter.config().limit, 50);
    }

    #[test]
    fn test_builder_validation() {
        let result = SlidingWindowBuilder::new().limit(0).try_build_on_demand();
        assert!(matches!(result, Err(LimiterError::InvalidConfiguration { .. })));

        let result = SlidingWindowBuilder::new()
            .size(Duration::from_micros(800))
            .try_build_background();
        assert!(matches!(result, Err(LimiterError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_builder_unvalidated() {
        // build_* defers configuration errors to decision time
        let limiter = SlidingWindowBuilder::new().limit(0).build_background();
        assert!(limiter.should_allow(1).is_err());
    }

    #[test]
    fn test_builder_clock() {
        let clock = ManualClock::new(5_000_000_000);
        let limiter = SlidingWindowBuilder::new()
            .limit(1)
            .size(Duration::from_secs(1))
            .clock(Arc::new(clock.clone()))
            .build_on_demand();

        assert_eq!(limiter.should_allow(1), Ok(true));
        assert_eq!(limiter.should_allow(1), Ok(false));

        clock.advance(Duration::from_secs(2));
        assert_eq!(limiter.should_allow(1), Ok(true));
    }

    #[test]
    fn test_thread_safety() {
        let limiter: SharedLimiter = Arc::new(OnDemandLimiter::with_clock(
            SlidingWindowConfig::per_minute(1_000),
            Arc::new(ManualClock::new(60_000_000_000)),
        ));
        let mut handles = vec![];

        for _ in 0..10 {
            let limiter_clone = limiter.clone();
            let handle = thread::spawn(move || {
                let mut allowed = 0;
                for _ in 0..200 {
                    if limiter_clone.should_allow(1).unwrap() {
                        allowed += 1;
                    }
                }
                allowed
            });
            handles.push(handle);
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(total, 1_000);
        assert_eq!(limiter.metrics().rejected_calls, 1_000);
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _limiter = OnDemandLimiter::new(SlidingWindowConfig::default());
        let _builder = SlidingWindowBuilder::default();
        let _strategy = AdvanceStrategy::Background;
        let _registry: SharedRegistry = Arc::new(KeyRegistry::default());
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(MSRV, "1.70.0");
    }
}
