//! Fixed-length counting bucket.
//!
//! A [`Window`] has no synchronization of its own; it is always mutated by a
//! limiter that holds its own lock.

/// One counting bucket: units admitted since `start_ns`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Window {
    count: u64,
    start_ns: u64,
}

impl Window {
    pub(crate) fn new(count: u64, start_ns: u64) -> Self {
        Self { count, start_ns }
    }

    #[inline]
    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub(crate) fn start_ns(&self) -> u64 {
        self.start_ns
    }

    #[inline]
    pub(crate) fn update_count(&mut self, n: u64) {
        self.count = self.count.saturating_add(n);
    }

    /// Empties the window and moves its start to `start_ns`.
    #[inline]
    pub(crate) fn reset_to_time(&mut self, start_ns: u64) {
        self.count = 0;
        self.start_ns = start_ns;
    }

    /// Copies `other` verbatim; used to promote `current` into `previous`.
    #[inline]
    pub(crate) fn set_state_from(&mut self, other: &Window) {
        self.count = other.count;
        self.start_ns = other.start_ns;
    }

    /// Sets both fields; used when a slide carries a count over.
    #[inline]
    pub(crate) fn set_to_state(&mut self, start_ns: u64, count: u64) {
        self.count = count;
        self.start_ns = start_ns;
    }

    pub(crate) fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            count: self.count,
            start_ns: self.start_ns,
        }
    }
}

/// Read-only copy of a window taken under the limiter lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowSnapshot {
    /// Units admitted into the window.
    pub count: u64,
    /// Window start, nanoseconds since the UNIX epoch.
    pub start_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_reset() {
        let mut window = Window::new(0, 100);
        window.update_count(3);
        window.update_count(4);
        assert_eq!(window.count(), 7);
        assert_eq!(window.start_ns(), 100);

        window.reset_to_time(250);
        assert_eq!(window.count(), 0);
        assert_eq!(window.start_ns(), 250);
    }

    #[test]
    fn test_promotion_keeps_count() {
        let mut previous = Window::default();
        let current = Window::new(40, 1_000);

        previous.set_state_from(&current);
        assert_eq!(previous, current);

        previous.set_to_state(2_000, 9);
        assert_eq!(
            previous.snapshot(),
            WindowSnapshot {
                count: 9,
                start_ns: 2_000
            }
        );
    }

    #[test]
    fn test_count_saturates() {
        let mut window = Window::new(u64::MAX - 1, 0);
        window.update_count(10);
        assert_eq!(window.count(), u64::MAX);
    }
}
