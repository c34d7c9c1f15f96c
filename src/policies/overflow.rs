//! # Overflow policies for the async dispatch queue.
//!
//! [`OverflowPolicy`] decides what [`EventBus::publish_async`](crate::EventBus::publish_async)
//! does when the bounded dispatch queue is full.
//!
//! - [`OverflowPolicy::Reject`] the new dispatch is refused with
//!   [`BusError::QueueSaturated`](crate::BusError::QueueSaturated) (default).
//! - [`OverflowPolicy::DropOldest`] the oldest queued (not yet started) dispatch
//!   is discarded to make room; the drop is counted in
//!   [`BusMetrics::dropped_dispatches`](crate::BusMetrics) and logged.
//! - [`OverflowPolicy::Block`] the caller awaits until a worker frees a slot.
//!
//! ## Choosing the right policy
//! ```text
//! Producer must never stall, loss must be visible   → Reject
//! Latest events matter more than old ones (UI)      → DropOldest
//! Every event must be delivered, producer may wait  → Block
//! ```

/// What to do with a new async dispatch when the queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Refuse the new dispatch with `QueueSaturated` (default).
    #[default]
    Reject,
    /// Evict the oldest queued dispatch and admit the new one.
    DropOldest,
    /// Wait for free capacity.
    Block,
}

impl OverflowPolicy {
    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::Reject => "reject",
            OverflowPolicy::DropOldest => "drop_oldest",
            OverflowPolicy::Block => "block",
        }
    }
}
