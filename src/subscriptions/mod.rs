//! Subscriptions: handles, registry and per-subscription statistics.
//!
//! ## Contents
//! - [`Subscription`] handle returned by subscribe calls (`id`, `event_type`,
//!   `is_active`, `cancel`, `stats`)
//! - [`SubscriptionStats`] snapshot of delivery counters
//! - `Registry` (crate-private) lock-protected store used by the bus

mod registry;
mod stats;
mod subscription;

pub(crate) use registry::Registry;
pub(crate) use stats::average;
pub use stats::SubscriptionStats;
pub(crate) use subscription::SubscriptionInner;
pub use subscription::{Matcher, Subscription, SubscriptionId};
