//! # Event handlers.
//!
//! This module provides the [`Handler`] trait, the closure-backed
//! [`HandlerFn`], the [`ErrorSink`] used by async dispatch and a few
//! built-in handlers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   producer ── publish(Event) ──► EventBus ──► snapshot of matching subscriptions
//!                                                  │  (ordered by priority, then registration)
//!                                                  ├──► tier 10: Handler::handle(ctx, &Event)
//!                                                  ├──► tier 5:  Handler::handle(ctx, &Event)
//!                                                  └──► tier 0:  Handler::handle(ctx, &Event)
//!                                                                   │
//!                                                     Err / panic ──┴──► HandlerError
//! ```
//!
//! ## Implementing custom handlers
//! ```no_run
//! use async_trait::async_trait;
//! use eventvisor::{Event, Handler, kind};
//! use tokio_util::sync::CancellationToken;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Handler for FailureCounter {
//!     async fn handle(&self, _ctx: CancellationToken, event: &Event) -> anyhow::Result<()> {
//!         if event.kind() == kind::TEST_FAILED {
//!             // increment failure counter
//!         }
//!         Ok(())
//!     }
//! }
//! ```

mod embedded;
mod handler;
mod handler_fn;
mod sink;

#[cfg(feature = "logging")]
pub use embedded::LogHandler;
pub use embedded::{PayloadTally, TallySnapshot};
pub use handler::{Handler, HandlerRef, priority};
pub use handler_fn::HandlerFn;
pub use sink::ErrorSink;
