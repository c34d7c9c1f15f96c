//! Dispatch policies.
//!
//! This module groups the knobs that control **how** the dispatcher runs
//! handlers and **what happens** when async dispatch outpaces the workers.
//!
//! ## Contents
//! - [`OverflowPolicy`] async queue saturation (reject / drop-oldest / block)
//! - [`TierMode`] sequential or concurrent execution inside a priority tier
//!
//! ## Quick wiring
//! ```text
//! BusConfig { overflow: OverflowPolicy, tier_mode: TierMode, .. }
//!      └─► core::pool::DispatchQueue uses overflow on admission
//!      └─► core::dispatch::Dispatcher uses tier_mode per tier
//! ```
//!
//! ## Defaults
//! - `OverflowPolicy::Reject` (saturation is an explicit error, never a silent drop).
//! - `TierMode::Sequential` (deterministic order within a tier).

mod overflow;
mod tier;

pub use overflow::OverflowPolicy;
pub use tier::TierMode;
