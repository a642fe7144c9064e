//! # On-Demand-Advance Limiter
//!
//! No threads. Each decision aligns the window pair to absolute `size`
//! boundaries before running the shared algorithm:
//!
//! ```text
//!     aligned = now - now % size
//!     slides  = (aligned - current.start) / size
//!
//!     slides == 0  ─► windows unchanged
//!     slides == 1  ─► previous = {aligned - size, current.count}
//!                     current  = {aligned, 0}
//!     slides >= 2  ─► previous = {aligned - size, 0}
//!                     current  = {aligned, 0}
//! ```
//!
//! Alignment is relative to the UNIX epoch, not to construction time, so two
//! limiters with the same `size` always share window boundaries.

use super::{
    config::SlidingWindowConfig,
    core::{Limiter, SlidingWindow},
    error::LimiterError,
    metrics::LimiterMetrics,
    utils::{Clock, SystemClock},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Sliding-window limiter that advances its windows inside each call.
///
/// ## Example
///
/// ```rust
/// use slidewin::{Limiter, ManualClock, OnDemandLimiter, SlidingWindowConfig};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = ManualClock::new(1_000_000_000_000);
/// let limiter = OnDemandLimiter::with_clock(
///     SlidingWindowConfig::per_second(100),
///     Arc::new(clock.clone()),
/// );
///
/// assert_eq!(limiter.should_allow(40), Ok(true));
///
/// // 1.4s later: 60% of the previous 40 units still count
/// clock.advance(Duration::from_millis(1400));
/// assert_eq!(limiter.should_allow(77), Ok(false));
/// assert_eq!(limiter.should_allow(76), Ok(true));
/// ```
#[derive(Debug)]
pub struct OnDemandLimiter {
    config: SlidingWindowConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<SlidingWindow>,
}

impl OnDemandLimiter {
    /// Creates a limiter reading the system clock.
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a limiter reading time from `clock`.
    pub fn with_clock(config: SlidingWindowConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(SlidingWindow::new()),
        }
    }
}

/// Moves `state` onto the window boundary containing `now_ns`.
fn align(state: &mut SlidingWindow, size_ns: u64, now_ns: u64) {
    let aligned = now_ns - now_ns % size_ns;
    let slides = aligned.saturating_sub(state.current.start_ns()) / size_ns;
    let previous_start = aligned.saturating_sub(size_ns);

    match slides {
        0 => {}
        1 => {
            let carried = state.current.count();
            state.previous.set_to_state(previous_start, carried);
            state.current.reset_to_time(aligned);
            debug!("Slid windows (previous: {} units, current start: {} ns)", carried, aligned);
        }
        _ => {
            state.previous.reset_to_time(previous_start);
            state.current.reset_to_time(aligned);
            debug!("Reset windows after {} idle windows (current start: {} ns)", slides, aligned);
        }
    }
}

impl Limiter for OnDemandLimiter {
    fn should_allow(&self, n: u64) -> Result<bool, LimiterError> {
        let mut state = self.state.lock();
        state.ensure_active(&self.config)?;

        // validated: size_ns >= 1ms
        let now = self.clock.now_ns();
        align(&mut state, self.config.size_ns(), now);
        Ok(state.admit(&self.config, now, n))
    }

    fn kill(&self) -> Result<(), LimiterError> {
        self.state.lock().mark_killed()
    }

    fn config(&self) -> SlidingWindowConfig {
        self.config
    }

    fn is_killed(&self) -> bool {
        self.state.lock().is_killed()
    }

    fn metrics(&self) -> LimiterMetrics {
        self.state.lock().metrics(&self.config)
    }
}
