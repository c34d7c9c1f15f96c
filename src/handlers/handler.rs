//! # Core handler trait
//!
//! [`Handler`] is the capability a consumer implements to receive events:
//! `can_handle` (pure match), `handle` (the work) and `priority` (tier).
//! The bus depends on nothing else.
//!
//! ## Contract
//! - `can_handle` must be cheap and side-effect free; it is evaluated after the
//!   subscription's type/filter already matched.
//! - `handle` signals failure by returning `Err`. A panic is caught by the
//!   dispatcher and reported as [`HandlerFault::Panicked`](crate::HandlerFault).
//! - `priority` is read once, when the subscription is created. Higher values
//!   dispatch earlier.
//! - `ctx` is cancelled when the publisher's token is cancelled or, for async
//!   dispatch, when [`EventBus::close`](crate::EventBus::close) stops waiting.
//!   The bus never interrupts a handler that ignores it.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use eventvisor::{Event, Handler, priority};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Handler for Audit {
//!     async fn handle(&self, _ctx: CancellationToken, ev: &Event) -> anyhow::Result<()> {
//!         let _ = ev.kind();
//!         Ok(())
//!     }
//!     fn priority(&self) -> i32 { priority::HIGH }
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::events::Event;

/// Conventional priority levels.
pub mod priority {
    pub const LOW: i32 = 1;
    pub const NORMAL: i32 = 5;
    pub const HIGH: i32 = 10;
    pub const CRITICAL: i32 = 15;
}

/// Contract for event handlers.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle a single event.
    ///
    /// # Parameters
    /// - `ctx`: cancellation context derived from the publish call
    /// - `event`: reference to the shared, immutable event
    async fn handle(&self, ctx: CancellationToken, event: &Event) -> anyhow::Result<()>;

    /// Second-stage match after the subscription's type/filter.
    fn can_handle(&self, _event: &Event) -> bool {
        true
    }

    /// Dispatch tier; higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;
