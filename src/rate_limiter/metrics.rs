//! # Limiter Metrics
//!
//! Point-in-time snapshots of a limiter, taken under its lock so both
//! windows and the counters are mutually consistent.
//!
//! ```text
//!     LimiterMetrics:
//!     ┌─────────────────────────────────────┐
//!     │  limit 100 / 1s                     │
//!     │  previous: 80 units                 │
//!     │  current:  30 units                 │
//!     │  allowed calls: 110  rejected: 12   │
//!     │  killed: false                      │
//!     └─────────────────────────────────────┘
//! ```

use super::window::WindowSnapshot;
use std::fmt;
use std::time::Duration;

/// Snapshot of one limiter's windows and decision counters.
///
/// ## Example
///
/// ```rust
/// use slidewin::{Limiter, OnDemandLimiter, SlidingWindowConfig};
///
/// let limiter = OnDemandLimiter::new(SlidingWindowConfig::per_second(10));
/// limiter.should_allow(4).unwrap();
///
/// let metrics = limiter.metrics();
/// assert_eq!(metrics.current.count, 4);
/// assert_eq!(metrics.allowed_units, 4);
/// println!("{}", metrics.summary());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterMetrics {
    /// Configured units per window.
    pub limit: u64,

    /// Configured window length.
    pub size: Duration,

    /// The window that most recently expired.
    pub previous: WindowSnapshot,

    /// The window currently accumulating units.
    pub current: WindowSnapshot,

    /// Decision calls that returned `true`.
    pub allowed_calls: u64,

    /// Units admitted across all allowed calls.
    pub allowed_units: u64,

    /// Decision calls that returned `false`.
    pub rejected_calls: u64,

    /// Whether `kill` has succeeded on this limiter.
    pub killed: bool,
}

impl LimiterMetrics {
    /// Total decision calls that reached the algorithm.
    #[inline]
    pub fn total_calls(&self) -> u64 {
        self.allowed_calls.saturating_add(self.rejected_calls)
    }

    /// Fraction of decision calls that were allowed; `1.0` before any call.
    #[inline]
    pub fn success_rate(&self) -> f64 {
        let total = self.total_calls();
        if total == 0 {
            1.0
        } else {
            self.allowed_calls as f64 / total as f64
        }
    }

    /// Fraction of decision calls that were rejected.
    #[inline]
    pub fn rejection_rate(&self) -> f64 {
        1.0 - self.success_rate()
    }

    /// Share of `limit` consumed by the current window alone.
    ///
    /// Can exceed `1.0` only if the limit was lowered, which this crate
    /// never does, so in practice it stays within `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            self.current.count as f64 / self.limit as f64
        }
    }

    /// Human-readable multi-line report.
    pub fn summary(&self) -> String {
        format!(
            "Sliding Window Limiter:\n\
             ├─ Config:\n\
             │  ├─ Limit: {} per {:?}\n\
             │  └─ Killed: {}\n\
             ├─ Windows:\n\
             │  ├─ Previous: {} units (start {} ns)\n\
             │  └─ Current: {} units (start {} ns)\n\
             └─ Decisions:\n\
                ├─ Allowed Calls: {} ({} units)\n\
                ├─ Rejected Calls: {}\n\
                ├─ Success Rate: {:.2}%\n\
                └─ Utilization: {:.2}%",
            self.limit,
            self.size,
            self.killed,
            self.previous.count,
            self.previous.start_ns,
            self.current.count,
            self.current.start_ns,
            self.allowed_calls,
            self.allowed_units,
            self.rejected_calls,
            self.success_rate() * 100.0,
            self.utilization() * 100.0,
        )
    }
}

impl fmt::Display for LimiterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LimiterMetrics {
        LimiterMetrics {
            limit: 100,
            size: Duration::from_secs(1),
            previous: WindowSnapshot {
                count: 80,
                start_ns: 0,
            },
            current: WindowSnapshot {
                count: 25,
                start_ns: 1_000_000_000,
            },
            allowed_calls: 75,
            allowed_units: 105,
            rejected_calls: 25,
            killed: false,
        }
    }

    #[test]
    fn test_metrics_calculations() {
        let metrics = sample();
        assert_eq!(metrics.total_calls(), 100);
        assert_eq!(metrics.success_rate(), 0.75);
        assert_eq!(metrics.rejection_rate(), 0.25);
        assert_eq!(metrics.utilization(), 0.25);
    }

    #[test]
    fn test_edge_cases() {
        let metrics = LimiterMetrics {
            allowed_calls: 0,
            rejected_calls: 0,
            limit: 0,
            ..sample()
        };
        assert_eq!(metrics.success_rate(), 1.0);
        assert_eq!(metrics.utilization(), 0.0);
    }

    #[test]
    fn test_metrics_display() {
        let display = format!("{}", sample());
        assert!(display.contains("Sliding Window Limiter"));
        assert!(display.contains("Limit: 100 per 1s"));
        assert!(display.contains("Previous: 80 units"));
        assert!(display.contains("Rejected Calls: 25"));
        assert!(display.contains("Success Rate: 75.00%"));
    }
}
