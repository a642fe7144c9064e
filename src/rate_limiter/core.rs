//! # Sliding Window Counter
//!
//! This module holds the decision logic shared by both limiter variants and
//! the [`Limiter`] trait they implement.
//!
//! ## The Algorithm
//!
//! Instead of logging every admitted unit, a limiter keeps two adjacent
//! fixed-size windows and assumes the previous window's traffic was spread
//! evenly over it. The part of the previous window still overlapping the
//! sliding interval `[now - size, now]` is weighted linearly:
//!
//! ```text
//!     size = 1s, limit = 100
//!
//!        previous (80)            current (30)
//!     ├───────────────────┼───────────────────┤
//!                 ├───────────────────┤
//!                 │  sliding interval │
//!                 now - size          now  (elapsed = 0.4s)
//!
//!     weight    = (size - elapsed) / size = 0.6
//!     estimated = floor(0.6 × 80) + 30    = 78
//!     should_allow(22) → true   (78 + 22 = 100)
//!     should_allow(23) → false  (78 + 23 > 100)
//! ```
//!
//! Memory and decision cost are O(1). A burst concentrated at one edge of a
//! window is mis-weighted by at most one window's worth of `previous.count`.
//!
//! ## Locking
//!
//! ```text
//!     caller A ──┐
//!                ├──► Mutex<SlidingWindow> ──► estimate + update
//!     caller B ──┘         ▲
//!                          │ promote / reset
//!                    advance worker (background variant only)
//! ```
//!
//! Every read and write of the window pair happens under one lock per
//! limiter. The critical section is integer arithmetic only.

use super::{
    config::SlidingWindowConfig,
    error::LimiterError,
    metrics::LimiterMetrics,
    window::Window,
};
use std::fmt;
use tracing::{debug, warn};

/// Capability shared by every limiter variant.
///
/// The [`KeyRegistry`](crate::KeyRegistry) stores limiters as
/// `Arc<dyn Limiter>`, so it never needs to know which advance strategy a
/// limiter uses.
///
/// ## Example
///
/// ```rust
/// use slidewin::{Limiter, LimiterError, OnDemandLimiter, SlidingWindowConfig};
///
/// let limiter = OnDemandLimiter::new(SlidingWindowConfig::per_second(10));
///
/// assert_eq!(limiter.should_allow(8), Ok(true));
/// assert_eq!(limiter.should_allow(5), Ok(false));
///
/// limiter.kill().unwrap();
/// assert_eq!(limiter.should_allow(1), Err(LimiterError::InactiveInstance));
/// assert_eq!(limiter.kill(), Err(LimiterError::AlreadyKilled));
/// ```
pub trait Limiter: Send + Sync + fmt::Debug {
    /// Decides whether `n` more units may proceed now.
    ///
    /// On `Ok(true)` the units are recorded in the current window. On
    /// `Ok(false)` nothing changes. A single call is never split, so `n`
    /// greater than the limit is always rejected.
    ///
    /// # Errors
    ///
    /// - [`LimiterError::InactiveInstance`] after a successful [`kill`](Self::kill).
    /// - [`LimiterError::InvalidConfiguration`] when `limit == 0` or the
    ///   window is shorter than [`MIN_WINDOW_SIZE`](crate::MIN_WINDOW_SIZE).
    fn should_allow(&self, n: u64) -> Result<bool, LimiterError>;

    /// Permanently deactivates the limiter.
    ///
    /// # Errors
    ///
    /// [`LimiterError::AlreadyKilled`] if the limiter was already killed.
    fn kill(&self) -> Result<(), LimiterError>;

    /// The configuration the limiter was built with.
    fn config(&self) -> SlidingWindowConfig;

    /// Whether [`kill`](Self::kill) has succeeded.
    fn is_killed(&self) -> bool;

    /// Consistent snapshot of windows and counters.
    fn metrics(&self) -> LimiterMetrics;
}

/// Window pair plus lifecycle state, always accessed under the owning
/// limiter's lock.
#[derive(Debug)]
pub(crate) struct SlidingWindow {
    pub(crate) previous: Window,
    pub(crate) current: Window,
    killed: bool,
    allowed_calls: u64,
    allowed_units: u64,
    rejected_calls: u64,
}

impl SlidingWindow {
    /// Both windows empty and anchored at the UNIX epoch.
    pub(crate) fn new() -> Self {
        Self {
            previous: Window::new(0, 0),
            current: Window::new(0, 0),
            killed: false,
            allowed_calls: 0,
            allowed_units: 0,
            rejected_calls: 0,
        }
    }

    /// Rejects calls on a killed limiter first, then on a bad configuration.
    pub(crate) fn ensure_active(&self, config: &SlidingWindowConfig) -> Result<(), LimiterError> {
        if self.killed {
            debug!("should_allow called on a killed limiter");
            return Err(LimiterError::InactiveInstance);
        }

        if let Err(err) = config.validate() {
            warn!(
                "Rejecting decision for invalid configuration (limit: {}, size: {:?})",
                config.limit, config.size
            );
            return Err(err);
        }

        Ok(())
    }

    /// Load estimate at `now_ns`: the overlapping share of `previous` plus all
    /// of `current`.
    ///
    /// The weight is computed in integer arithmetic, so the floor is exact.
    pub(crate) fn estimate(&self, size_ns: u64, now_ns: u64) -> u64 {
        let elapsed = now_ns.saturating_sub(self.current.start_ns());
        let remaining = size_ns.saturating_sub(elapsed);

        // remaining <= size_ns, so the quotient never exceeds previous.count
        let weighted = if size_ns == 0 {
            0
        } else {
            (u128::from(self.previous.count()) * u128::from(remaining) / u128::from(size_ns)) as u64
        };

        weighted.saturating_add(self.current.count())
    }

    /// Runs one decision at `now_ns`. Windows must already be current.
    pub(crate) fn admit(&mut self, config: &SlidingWindowConfig, now_ns: u64, n: u64) -> bool {
        let estimated = self.estimate(config.size_ns(), now_ns);

        if estimated.saturating_add(n) > config.limit {
            self.rejected_calls = self.rejected_calls.saturating_add(1);
            return false;
        }

        self.current.update_count(n);
        self.allowed_calls = self.allowed_calls.saturating_add(1);
        self.allowed_units = self.allowed_units.saturating_add(n);
        true
    }

    /// Promotes `current` into `previous` and opens a fresh `current` at `now_ns`.
    pub(crate) fn slide_to(&mut self, now_ns: u64) {
        let current = self.current;
        self.previous.set_state_from(&current);
        self.current.reset_to_time(now_ns);
    }

    /// Flips the one-way `killed` latch.
    pub(crate) fn mark_killed(&mut self) -> Result<(), LimiterError> {
        if self.killed {
            warn!("kill called on an already killed limiter");
            return Err(LimiterError::AlreadyKilled);
        }
        self.killed = true;
        Ok(())
    }

    #[inline]
    pub(crate) fn is_killed(&self) -> bool {
        self.killed
    }

    pub(crate) fn metrics(&self, config: &SlidingWindowConfig) -> LimiterMetrics {
        LimiterMetrics {
            limit: config.limit,
            size: config.size,
            previous: self.previous.snapshot(),
            current: self.current.snapshot(),
            allowed_calls: self.allowed_calls,
            allowed_units: self.allowed_units,
            rejected_calls: self.rejected_calls,
            killed: self.killed,
        }
    }
}
