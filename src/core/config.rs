//! # Bus configuration.
//!
//! Provides [`BusConfig`] centralized settings for one [`EventBus`](crate::EventBus).
//!
//! Config is used once, at construction: `EventBus::new(cfg)` or
//! `EventBus::builder(cfg).build()`.
//!
//! ## Sentinel values
//! - `workers = 0` → clamped to 1
//! - `queue_capacity = 0` → clamped to 1
//! - `grace = 0s` → `close()` does not wait; queued dispatches are abandoned immediately

use std::time::Duration;

use crate::policies::{OverflowPolicy, TierMode};

/// Configuration for an event bus.
///
/// ## Field semantics
/// - `workers`: async dispatch workers (min 1)
/// - `queue_capacity`: admitted-but-not-started async dispatches (min 1)
/// - `overflow`: what `publish_async` does when the queue is full
/// - `tier_mode`: sequential or concurrent execution inside one priority tier
/// - `grace`: how long `close()` waits for queued/in-flight async dispatches
///
/// ## Notes
/// All fields are public. Prefer the clamping accessors over reading the raw
/// values.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Number of worker tasks draining the async dispatch queue.
    pub workers: usize,

    /// Maximum number of async dispatches waiting for a worker.
    ///
    /// A dispatch is one published event together with its ordered handler
    /// snapshot; it occupies one slot regardless of how many handlers matched.
    pub queue_capacity: usize,

    /// Policy applied by `publish_async` when the queue is full.
    pub overflow: OverflowPolicy,

    /// Execution inside a priority tier.
    pub tier_mode: TierMode,

    /// Maximum time `close()` waits for async dispatch to drain.
    ///
    /// When exceeded:
    /// - still-queued dispatches are discarded and counted as dropped
    /// - the bus shutdown token is cancelled (handlers see `ctx.is_cancelled()`)
    /// - running handlers are detached, not interrupted
    pub grace: Duration,
}

impl BusConfig {
    #[inline]
    pub fn workers_clamped(&self) -> usize {
        self.workers.max(1)
    }

    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns the grace period as an `Option` (`None` = do not wait).
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace.is_zero() {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `workers = 4`
    /// - `queue_capacity = 1024`
    /// - `overflow = OverflowPolicy::Reject`
    /// - `tier_mode = TierMode::Sequential`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            overflow: OverflowPolicy::default(),
            tier_mode: TierMode::default(),
            grace: Duration::from_secs(5),
        }
    }
}
