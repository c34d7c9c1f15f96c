//! # EventBus: subscriptions, sync/async dispatch and graceful close.
//!
//! The [`EventBus`] owns the subscription registry, the dispatcher, the
//! bounded async dispatch queue with its workers, the bus counters and the
//! shutdown token. It is an explicitly constructed object; share it as
//! `Arc<EventBus>`.
//!
//! ## High-level architecture
//! ```text
//! subscribe(type, h) / subscribe_with_filter(f, h)
//!        └──► Registry::insert ──► Subscription { id, matcher, active, stats }
//!
//! publish(ev) / publish_with(ev, &token)            (caller's task)
//!   admit (open? non-empty type?) ─► stamp id/timestamp ─► total_events += 1
//!   Registry::snapshot(ev)  ──► [p15 ...][p10 ...][p5 ...]
//!   Dispatcher::deliver(ev, targets, child token) ──► Err(Dispatch) if any handler failed
//!
//! publish_async(ev)                                  (returns after admission)
//!   admit ─► stamp ─► snapshot ─► DispatchQueue::push(Job)
//!                                   └──► worker 1..W ──► Dispatcher::run_job
//!                                                          └─ failures → stats / counters / ErrorSink
//!
//! close()
//!   Open → Closing ─► Registry::close (all subscriptions cancelled)
//!                 ─► DispatchQueue::close (no new jobs, workers drain)
//!                 ─► wait workers up to cfg.grace:
//!                      ├─ joined     → Drained
//!                      └─ timed out  → abandon queue, cancel shutdown token → GraceExceeded
//!   → Closed
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use eventvisor::{BusConfig, Event, EventBus, EventFilter, HandlerFn, kind, source};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new(BusConfig::default());
//!
//!     let sub = bus.subscribe(
//!         kind::TEST_COMPLETED,
//!         HandlerFn::arc("report", |_ctx: CancellationToken, ev: Event| async move {
//!             let _ = ev.payload().test_result();
//!             Ok::<_, anyhow::Error>(())
//!         }),
//!     )?;
//!     bus.subscribe_with_filter(
//!         EventFilter::source(source::FILE_WATCHER),
//!         HandlerFn::arc("reload", |_ctx: CancellationToken, _ev: Event| async {
//!             Ok::<_, anyhow::Error>(())
//!         }),
//!     )?;
//!
//!     bus.publish(Event::new(kind::TEST_COMPLETED)).await?;
//!     assert_eq!(sub.stats().delivered, 1);
//!
//!     bus.close().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::builder::EventBusBuilder;
use super::config::BusConfig;
use super::dispatch::Dispatcher;
use super::lifecycle::{BusState, Lifecycle, ShutdownReport};
use super::metrics::{BusCounters, BusMetrics};
use super::pool::{DispatchQueue, Job};
use crate::error::{BusError, DispatchError};
use crate::events::{Event, EventFilter};
use crate::handlers::HandlerRef;
use crate::subscriptions::{Matcher, Registry, Subscription};

/// In-process publish/subscribe event bus.
pub struct EventBus {
    cfg: BusConfig,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    queue: Arc<DispatchQueue>,
    counters: Arc<BusCounters>,
    lifecycle: Lifecycle,
    shutdown: CancellationToken,
    /// Worker handles; taken by the first `close()`.
    workers: Mutex<Option<Vec<JoinHandle<()>>>>,
}

impl EventBus {
    /// Creates a bus with the given configuration and no error sink.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(cfg: BusConfig) -> Arc<Self> {
        EventBusBuilder::new(cfg).build()
    }

    /// Returns a builder for configuring optional features.
    pub fn builder(cfg: BusConfig) -> EventBusBuilder {
        EventBusBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: BusConfig,
        registry: Arc<Registry>,
        dispatcher: Arc<Dispatcher>,
        queue: Arc<DispatchQueue>,
        counters: Arc<BusCounters>,
        shutdown: CancellationToken,
        workers: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            cfg,
            registry,
            dispatcher,
            queue,
            counters,
            lifecycle: Lifecycle::new(),
            shutdown,
            workers: Mutex::new(Some(workers)),
        }
    }

    /// Subscribes `handler` to events whose type equals `event_type`.
    ///
    /// # Errors
    /// - [`BusError::Validation`] if `event_type` is empty
    /// - [`BusError::Closed`] once `close()` has started
    pub fn subscribe(
        &self,
        event_type: impl Into<Arc<str>>,
        handler: HandlerRef,
    ) -> Result<Subscription, BusError> {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(BusError::Validation {
                reason: "event type must not be empty",
            });
        }
        self.register(Matcher::Type(event_type), handler)
    }

    /// Subscribes `handler` to every event matching `filter`, regardless of type.
    ///
    /// # Errors
    /// - [`BusError::Closed`] once `close()` has started
    pub fn subscribe_with_filter(
        &self,
        filter: EventFilter,
        handler: HandlerRef,
    ) -> Result<Subscription, BusError> {
        self.register(Matcher::Filter(filter), handler)
    }

    fn register(&self, matcher: Matcher, handler: HandlerRef) -> Result<Subscription, BusError> {
        if !self.lifecycle.is_open() {
            return Err(BusError::Closed);
        }
        let sub = self.registry.insert(matcher, handler)?;
        self.counters.subscription_created();
        tracing::debug!(
            subscription = %sub.id(),
            handler = sub.handler_name(),
            priority = sub.priority(),
            matcher = ?sub.matcher(),
            "subscribed"
        );
        Ok(sub)
    }

    /// Cancels `subscription`. Cancelling twice is a no-op.
    ///
    /// # Errors
    /// - [`BusError::Validation`] if the subscription was created by another bus
    /// - [`BusError::Closed`] once `close()` has started (every subscription is
    ///   already cancelled by then)
    pub fn unsubscribe(&self, subscription: &Subscription) -> Result<(), BusError> {
        if !subscription.belongs_to(&self.registry) {
            return Err(BusError::Validation {
                reason: "subscription belongs to another bus",
            });
        }
        if !self.lifecycle.is_open() {
            return Err(BusError::Closed);
        }
        subscription.cancel();
        Ok(())
    }

    /// Publishes `event` and waits until every matching handler has run.
    ///
    /// Handlers receive a child of the bus shutdown token.
    ///
    /// # Errors
    /// - [`BusError::Validation`] if the event type is empty
    /// - [`BusError::Closed`] once `close()` has started
    /// - [`BusError::Dispatch`] listing every failed handler; all matching
    ///   handlers still ran
    pub async fn publish(&self, event: Event) -> Result<(), BusError> {
        self.publish_with(event, &self.shutdown).await
    }

    /// Like [`publish`](Self::publish), with handler contexts derived from `token`.
    pub async fn publish_with(&self, event: Event, token: &CancellationToken) -> Result<(), BusError> {
        let event = self.admit(event)?;
        self.counters.event_admitted(stamp_of(&event));

        let targets = self.registry.snapshot(&event);
        tracing::debug!(event = %event, targets = targets.len(), "publish");
        if targets.is_empty() {
            return Ok(());
        }

        let ctx = token.child_token();
        let failures = self.dispatcher.deliver(&event, &targets, &ctx).await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::Dispatch(DispatchError { failures }))
        }
    }

    /// Admits `event` for asynchronous dispatch and returns without running handlers.
    ///
    /// Handler failures are never returned here; see
    /// [`EventBusBuilder::with_error_sink`].
    ///
    /// # Errors
    /// - [`BusError::Validation`] if the event type is empty
    /// - [`BusError::Closed`] once `close()` has started
    /// - [`BusError::QueueSaturated`] if the queue is full under
    ///   [`OverflowPolicy::Reject`](crate::OverflowPolicy::Reject)
    ///
    /// Under [`OverflowPolicy::Block`](crate::OverflowPolicy::Block) this
    /// awaits free queue capacity. Do not call it that way from an async
    /// handler: with every worker blocked the queue never drains.
    pub async fn publish_async(&self, event: Event) -> Result<(), BusError> {
        let event = self.admit(event)?;
        let at = stamp_of(&event);

        let targets = self.registry.snapshot(&event);
        if targets.is_empty() {
            tracing::debug!(event = %event, "publish_async: no subscribers");
            self.counters.event_admitted(at);
            return Ok(());
        }

        let job = Job {
            event: Arc::new(event),
            targets,
        };
        match self.queue.push(job).await {
            Ok(evicted) => {
                self.counters.event_admitted(at);
                self.counters.dispatch_queued();
                if let Some(old) = evicted {
                    self.counters.dispatches_dropped(1);
                    tracing::warn!(evicted = %old.event, "dispatch queue full; dropped oldest");
                }
                Ok(())
            }
            Err(e) => {
                if let BusError::QueueSaturated { capacity } = e {
                    tracing::warn!(capacity, "dispatch queue saturated; event rejected");
                }
                Err(e)
            }
        }
    }

    fn admit(&self, event: Event) -> Result<Event, BusError> {
        if !self.lifecycle.is_open() {
            return Err(BusError::Closed);
        }
        if event.kind().is_empty() {
            return Err(BusError::Validation {
                reason: "event type must not be empty",
            });
        }
        Ok(event.stamped())
    }

    /// Closes the bus. Idempotent; never fails.
    ///
    /// Stops admitting work, cancels every subscription and waits up to
    /// [`BusConfig::grace`] for admitted async dispatches. A concurrent second
    /// caller waits for the first one and gets [`ShutdownReport::AlreadyClosed`].
    pub async fn close(&self) -> ShutdownReport {
        let mut guard = self.workers.lock().await;
        let Some(workers) = guard.take() else {
            return ShutdownReport::AlreadyClosed;
        };
        self.lifecycle.begin_close();

        let cancelled = self.registry.close();
        self.queue.close();
        tracing::info!(
            subscriptions = cancelled,
            queued = self.queue.depth(),
            "event bus closing"
        );

        let all = futures::future::join_all(workers);
        let drained = match self.cfg.grace_period() {
            Some(grace) => tokio::time::timeout(grace, all).await.is_ok(),
            None => {
                drop(all);
                self.queue.depth() == 0 && self.queue.running() == 0
            }
        };

        let report = if drained {
            ShutdownReport::Drained
        } else {
            let abandoned = self.queue.abandon();
            self.counters.dispatches_dropped(abandoned);
            self.shutdown.cancel();
            tracing::warn!(
                grace = ?self.cfg.grace,
                abandoned,
                running = self.queue.running(),
                "grace period exceeded; abandoning async dispatch"
            );
            ShutdownReport::GraceExceeded {
                grace: self.cfg.grace,
                abandoned,
            }
        };

        self.lifecycle.finish_close();
        tracing::info!(report = ?report, "event bus closed");
        report
    }

    /// Snapshot of the bus counters.
    pub fn metrics(&self) -> BusMetrics {
        self.counters
            .snapshot(self.registry.len(), self.queue.depth())
    }

    pub fn state(&self) -> BusState {
        self.lifecycle.state()
    }

    /// `true` once `close()` has started.
    pub fn is_closed(&self) -> bool {
        !self.lifecycle.is_open()
    }

    pub fn config(&self) -> &BusConfig {
        &self.cfg
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.queue.close();
        self.shutdown.cancel();
    }
}

fn stamp_of(event: &Event) -> SystemTime {
    event.timestamp().unwrap_or_else(SystemTime::now)
}
