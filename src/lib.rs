//! # eventvisor
//!
//! **Eventvisor** is an in-process publish/subscribe event bus for Rust.
//!
//! Producers publish immutable [`Event`]s; consumers register [`Handler`]s,
//! either for one exact event type or for a composable [`EventFilter`].
//! The bus orders matching handlers into priority tiers, isolates failures
//! and panics, and offers a synchronous mode (await every handler, get an
//! aggregate error) and an asynchronous mode (bounded worker pool, errors
//! go to stats and an optional sink).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   file watcher        test executor        application
//!        │                    │                   │
//!        └── publish / publish_with / publish_async ┘
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                         │
//! │  - Registry    (by type + filtered list, RwLock, snapshot)        │
//! │  - Dispatcher  (tiers by priority, catch_unwind, stats)           │
//! │  - DispatchQueue + W workers (bounded, overflow policy)           │
//! │  - BusCounters (lock-free metrics)                                │
//! │  - Lifecycle   (open → closing → closed) + shutdown token         │
//! └──────┬──────────────────────────┬──────────────────────────┬──────┘
//!        ▼                          ▼                          ▼
//!   tier CRITICAL (15)  ──►   tier HIGH (10)   ──►  ...  tier LOW (1)
//!   handler.handle(ctx, &ev)  handler.handle(ctx, &ev)   handler.handle(ctx, &ev)
//!        │                          │                          │
//!        └──── Err / panic ─► HandlerError ─► DispatchError (sync) | ErrorSink (async)
//! ```
//!
//! ### Lifecycle
//! ```text
//! EventBus::new(cfg) ──► Open
//!   subscribe / subscribe_with_filter ──► Subscription (active)
//!   publish*  ──► snapshot ──► tiers ──► stats + metrics
//!   Subscription::cancel / unsubscribe ──► cancelled (terminal)
//! close() ──► Closing ──► drain async queue (≤ grace) ──► Closed
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                               |
//! |-------------------|------------------------------------------------------------|--------------------------------------------------|
//! | **Events**        | Immutable events with typed payloads and metadata.         | [`Event`], [`Payload`], [`kind`], [`source`]     |
//! | **Handlers**      | Consumer capability and closure-backed helper.             | [`Handler`], [`HandlerFn`], [`priority`]         |
//! | **Filters**       | Composable predicates over type, source and metadata.      | [`EventFilter`]                                  |
//! | **Subscriptions** | Cancellable bindings with per-subscription statistics.     | [`Subscription`], [`SubscriptionStats`]          |
//! | **Bus**           | Sync/async dispatch, metrics and graceful close.           | [`EventBus`], [`BusMetrics`], [`ShutdownReport`] |
//! | **Policies**      | Queue overflow and in-tier execution.                      | [`OverflowPolicy`], [`TierMode`]                 |
//! | **Errors**        | Typed errors for admission and handler failures.           | [`BusError`], [`DispatchError`], [`HandlerError`]|
//! | **Configuration** | Centralize bus settings.                                   | [`BusConfig`]                                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogHandler`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use eventvisor::{
//!     BusConfig, Event, EventBus, HandlerFn, TestResult, TestStatus, kind, priority,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::builder(BusConfig::default())
//!         .with_error_sink(|e: &eventvisor::HandlerError| eprintln!("async failure: {e}"))
//!         .build();
//!
//!     let summary = HandlerFn::new("summary", |_ctx: CancellationToken, ev: Event| async move {
//!         if let Some(result) = ev.payload().test_result() {
//!             println!("{} → {:?}", result.id, result.status);
//!         }
//!         Ok::<_, anyhow::Error>(())
//!     })
//!     .with_priority(priority::HIGH);
//!
//!     let sub = bus.subscribe(kind::TEST_COMPLETED, std::sync::Arc::new(summary))?;
//!
//!     let result = TestResult::new("parses_empty_input", "core", TestStatus::Passed);
//!     bus.publish(Event::test_completed(result, Duration::from_millis(12))).await?;
//!     bus.publish_async(Event::new(kind::APP_STOPPED)).await?;
//!
//!     assert_eq!(sub.stats().delivered, 1);
//!     bus.close().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
mod policies;
mod subscriptions;

// ---- Public re-exports ----

pub use crate::core::{BusConfig, BusMetrics, BusState, EventBus, EventBusBuilder, ShutdownReport};
pub use error::{BusError, DispatchError, HandlerError, HandlerFault};
pub use events::{
    ChangeKind, Event, EventFilter, FileChange, Payload, TestCompletion, TestResult, TestStart,
    TestStatus, kind, source,
};
pub use handlers::{ErrorSink, Handler, HandlerFn, HandlerRef, PayloadTally, TallySnapshot, priority};
pub use policies::{OverflowPolicy, TierMode};
pub use subscriptions::{Matcher, Subscription, SubscriptionId, SubscriptionStats};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use handlers::LogHandler;
