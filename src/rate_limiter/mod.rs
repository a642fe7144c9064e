//! # Rate Limiter Module
//!
//! Internal implementation of the sliding-window limiters and the key
//! registry, split into one submodule per concern.
//!
//! ## Module Structure
//!
//! ```text
//!     rate_limiter/
//!     ├── mod.rs          (You are here - Module organization)
//!     ├── config.rs       (Limit, window size, advance strategy)
//!     ├── error.rs        (Limiter and registry errors)
//!     ├── window.rs       (Fixed-size counting bucket)
//!     ├── core.rs         (Shared sliding-window algorithm, Limiter trait)
//!     ├── background.rs   (Thread-advanced limiter)
//!     ├── on_demand.rs    (Call-advanced limiter)
//!     ├── registry.rs     (Key → limiter map)
//!     ├── metrics.rs      (Limiter snapshots)
//!     └── utils.rs        (Time sources)
//! ```
//!
//! ## Architecture Flow
//!
//! ```text
//!     should_allow(key, n)
//!          │
//!          ▼
//!     ┌──────────┐
//!     │ Registry │ ◄── key lookup
//!     └────┬─────┘
//!          │
//!          ▼
//!     ┌──────────────────────────────┐
//!     │ Background  │  OnDemand      │ ◄── keep windows current
//!     └────┬─────────────────────────┘
//!          │
//!          ▼
//!     ┌──────────┐
//!     │   Core   │ ◄── estimate, accept or reject
//!     └────┬─────┘
//!          │
//!          ▼
//!     ┌──────────┐
//!     │  Window  │ ◄── previous / current counts
//!     └──────────┘
//! ```

mod background;
mod config;
mod core;
mod error;
mod metrics;
mod on_demand;
mod registry;
mod utils;
mod window;

/// Limit, window size and advance strategy
pub use config::{AdvanceStrategy, SlidingWindowConfig, MIN_WINDOW_SIZE};

/// The capability every limiter variant implements
pub use self::core::Limiter;

/// Limiter whose windows are advanced by a worker thread
pub use background::BackgroundLimiter;

/// Limiter whose windows are advanced inside each call
pub use on_demand::OnDemandLimiter;

/// Per-key limiter map
pub use registry::{KeyRegistry, RegistryStats};

/// Error types
pub use error::{LimiterError, RegistryError};

/// Observability snapshots
pub use metrics::LimiterMetrics;
pub use window::WindowSnapshot;

/// Time sources
pub use utils::{current_time_ns, Clock, ManualClock, SystemClock};
