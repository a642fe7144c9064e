//! # Time Sources (utils.rs)
//!
//! Limiters read time as nanoseconds since the UNIX epoch. Absolute values
//! matter: the on-demand limiter truncates `now` to multiples of the window
//! size, so every limiter with the same `size` shares the same boundaries.
//!
//! ```text
//!     Clock
//!     ├─ SystemClock  ──► wall-clock anchor + monotonic Instant
//!     └─ ManualClock  ──► explicitly set / advanced (tests, simulations)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// Wall-clock epoch nanoseconds captured once, advanced by a monotonic
// Instant so a system clock jump never moves window boundaries backwards.
static START_TIME_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Returns the current time in nanoseconds since the UNIX epoch.
///
/// The value is anchored to the wall clock on first use and advances
/// monotonically afterwards.
///
/// # Example
///
/// ```rust
/// use slidewin::current_time_ns;
///
/// let a = current_time_ns();
/// let b = current_time_ns();
/// assert!(b >= a);
/// ```
#[inline]
pub fn current_time_ns() -> u64 {
    let (start, base_ns) = START_TIME_BASE.get_or_init(|| {
        let epoch_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        (Instant::now(), u64::try_from(epoch_ns).unwrap_or(u64::MAX))
    });
    let elapsed = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
    base_ns.saturating_add(elapsed)
}

/// Source of "now" for a limiter.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in nanoseconds since the UNIX epoch.
    fn now_ns(&self) -> u64;
}

/// Production clock backed by [`current_time_ns`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        current_time_ns()
    }
}

/// Clock whose time only moves when told to.
///
/// Clones share the same underlying time value, so a clone handed to a
/// limiter can be driven from the test body.
///
/// # Example
///
/// ```rust
/// use slidewin::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new(1_000_000_000);
/// clock.advance(Duration::from_millis(400));
/// assert_eq!(clock.now_ns(), 1_400_000_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start_ns` nanoseconds since the UNIX epoch.
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(start_ns)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .now_ns
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(by))
            });
    }

    /// Sets the clock to `now_ns`.
    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::Release);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::Acquire)
    }
}
