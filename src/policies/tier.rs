//! # Execution mode inside one priority tier.
//!
//! Tiers always run strictly one after another in descending priority. The
//! [`TierMode`] only decides what happens *inside* a tier:
//!
//! ```text
//! Sequential (default):  [p10: A → B] → [p5: C → D]      registration order, deterministic
//! Concurrent:            [p10: A ∥ B] → [p5: C ∥ D]      joined before the next tier starts
//! ```

/// How handlers sharing a priority are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TierMode {
    /// One after another, in registration order (default).
    #[default]
    Sequential,
    /// All handlers of a tier polled concurrently on the dispatching task.
    Concurrent,
}
