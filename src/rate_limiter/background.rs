//! # Background-Advance Limiter
//!
//! Each [`BackgroundLimiter`] owns one worker thread that slides its windows
//! every `size`. Decision calls never do window bookkeeping; they read windows
//! the worker keeps fresh.
//!
//! ```text
//!     BackgroundLimiter
//!     ├─ Arc<Shared> ◄──────────────────────────┐
//!     │   └─ Mutex<SlidingWindow>                │
//!     └─ Worker                                  │
//!         ├─ stop_tx ──► stop_rx                 │
//!         └─ JoinHandle ─► loop {                │
//!                            recv_timeout(current.start + size - now)
//!                              Timeout  ─► lock, promote, reset ─┘
//!                              Stop     ─► exit
//!                          }
//! ```
//!
//! The wait is interruptible, so `kill` (or dropping the limiter) stops the
//! worker right away instead of after the pending window.

use super::{
    config::SlidingWindowConfig,
    core::{Limiter, SlidingWindow},
    error::LimiterError,
    metrics::LimiterMetrics,
    utils::current_time_ns,
};
use parking_lot::Mutex;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// State shared between the limiter handle and its worker.
#[derive(Debug)]
struct Shared {
    config: SlidingWindowConfig,
    state: Mutex<SlidingWindow>,
}

#[derive(Debug)]
struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl Worker {
    fn stop(self) {
        // The worker may already have exited; a closed channel is fine.
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            warn!("Window advance thread panicked");
        }
    }
}

/// Sliding-window limiter whose windows are advanced by a dedicated thread.
///
/// Windows start anchored at the UNIX epoch, so the worker performs its first
/// slide as soon as it runs and then once per `size`.
///
/// ## Example
///
/// ```rust
/// use slidewin::{BackgroundLimiter, Limiter, SlidingWindowConfig};
/// use std::time::Duration;
///
/// let limiter = BackgroundLimiter::new(SlidingWindowConfig::new(100, Duration::from_secs(5)));
///
/// assert_eq!(limiter.should_allow(60), Ok(true));
/// assert_eq!(limiter.should_allow(50), Ok(false));
///
/// limiter.kill().unwrap();
/// ```
#[derive(Debug)]
pub struct BackgroundLimiter {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl BackgroundLimiter {
    /// Creates a limiter and starts its advance thread.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the thread. Use
    /// [`try_new`](Self::try_new) to handle that case.
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self::try_new(config).expect("Failed to spawn window advance thread")
    }

    /// Creates a limiter and starts its advance thread.
    ///
    /// An invalid configuration is accepted without starting a thread; the
    /// limiter then reports [`LimiterError::InvalidConfiguration`] on every
    /// decision.
    ///
    /// # Errors
    ///
    /// [`LimiterError::WorkerSpawn`] if the thread could not be spawned.
    pub fn try_new(config: SlidingWindowConfig) -> Result<Self, LimiterError> {
        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(SlidingWindow::new()),
        });

        let worker = if config.is_valid() {
            Some(spawn_worker(Arc::clone(&shared))?)
        } else {
            debug!(
                "Not starting window advance thread for invalid configuration (limit: {}, size: {:?})",
                config.limit, config.size
            );
            None
        };

        Ok(Self {
            shared,
            worker: Mutex::new(worker),
        })
    }

    /// Whether the advance thread is still attached to this limiter.
    pub fn has_worker(&self) -> bool {
        self.worker.lock().is_some()
    }
}

fn spawn_worker(shared: Arc<Shared>) -> Result<Worker, LimiterError> {
    let (stop_tx, stop_rx) = mpsc::channel();
    let size_ns = shared.config.size_ns();

    let handle = thread::Builder::new()
        .name("slidewin-advance".to_string())
        .spawn(move || {
            info!(
                "Started window advance thread (limit: {}, size: {:?})",
                shared.config.limit, shared.config.size
            );

            loop {
                let wait = {
                    let state = shared.state.lock();
                    if state.is_killed() {
                        break;
                    }
                    let next_slide = state.current.start_ns().saturating_add(size_ns);
                    Duration::from_nanos(next_slide.saturating_sub(current_time_ns()))
                };

                match stop_rx.recv_timeout(wait) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let mut state = shared.state.lock();
                        let now = current_time_ns();
                        state.slide_to(now);
                        debug!(
                            "Slid windows (previous: {} units, current start: {} ns)",
                            state.previous.count(),
                            now
                        );
                    }
                }
            }

            info!("Window advance thread stopping");
        })
        .map_err(|err| LimiterError::WorkerSpawn(err.to_string()))?;

    Ok(Worker { stop_tx, handle })
}

impl Limiter for BackgroundLimiter {
    fn should_allow(&self, n: u64) -> Result<bool, LimiterError> {
        let config = &self.shared.config;
        let mut state = self.shared.state.lock();
        state.ensure_active(config)?;
        Ok(state.admit(config, current_time_ns(), n))
    }

    fn kill(&self) -> Result<(), LimiterError> {
        self.shared.state.lock().mark_killed()?;

        // Joined outside the window lock: the worker takes it to slide.
        if let Some(worker) = self.worker.lock().take() {
            worker.stop();
        }
        Ok(())
    }

    fn config(&self) -> SlidingWindowConfig {
        self.shared.config
    }

    fn is_killed(&self) -> bool {
        self.shared.state.lock().is_killed()
    }

    fn metrics(&self) -> LimiterMetrics {
        self.shared.state.lock().metrics(&self.shared.config)
    }
}

impl Drop for BackgroundLimiter {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.stop();
        }
    }
}
