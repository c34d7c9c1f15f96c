//! # Bus-wide counters and their snapshot.
//!
//! [`BusCounters`] is the live, lock-free side written by the bus and the
//! dispatcher; [`BusMetrics`] is the independent copy handed to callers by
//! [`EventBus::metrics`](crate::EventBus::metrics).
//!
//! Counters are bumped right after each decision (admission, eviction,
//! handler outcome), never batched. A snapshot is therefore consistent per
//! field but may be slightly stale relative to dispatches still in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::HandlerFault;
use crate::subscriptions::average;

/// Point-in-time copy of the bus counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BusMetrics {
    /// Events admitted by `publish`, `publish_with` or `publish_async`.
    pub total_events: u64,
    /// Subscriptions currently registered.
    pub active_subscriptions: usize,
    /// Subscriptions ever created.
    pub total_subscriptions: u64,
    /// Async dispatches admitted into the queue.
    pub async_dispatches: u64,
    /// Async dispatches evicted by `DropOldest` or abandoned at close.
    pub dropped_dispatches: u64,
    /// Handler invocations (sync and async).
    pub handler_invocations: u64,
    /// Failed handler invocations, panics included.
    pub handler_errors: u64,
    /// Handler invocations that panicked.
    pub handler_panics: u64,
    /// Sum of handler latencies.
    pub total_processing_time: Duration,
    /// Wall-clock time of the last admitted event.
    pub last_event_at: Option<SystemTime>,
    /// Async dispatches waiting for a worker at snapshot time.
    pub queue_depth: usize,
    /// Time since the bus was built.
    pub uptime: Duration,
    /// `total_events` averaged over `uptime`.
    pub events_per_second: f64,
}

impl BusMetrics {
    /// Mean handler latency; zero before the first invocation.
    pub fn average_processing_time(&self) -> Duration {
        average(self.total_processing_time, self.handler_invocations)
    }
}

/// Live counters shared by the bus, dispatcher and workers.
pub(crate) struct BusCounters {
    started_at: Instant,
    total_events: AtomicU64,
    total_subscriptions: AtomicU64,
    async_dispatches: AtomicU64,
    dropped_dispatches: AtomicU64,
    handler_invocations: AtomicU64,
    handler_errors: AtomicU64,
    handler_panics: AtomicU64,
    processing_nanos: AtomicU64,
    last_event_at: Mutex<Option<SystemTime>>,
}

impl Default for BusCounters {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            total_events: AtomicU64::new(0),
            total_subscriptions: AtomicU64::new(0),
            async_dispatches: AtomicU64::new(0),
            dropped_dispatches: AtomicU64::new(0),
            handler_invocations: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            handler_panics: AtomicU64::new(0),
            processing_nanos: AtomicU64::new(0),
            last_event_at: Mutex::new(None),
        }
    }
}

impl BusCounters {
    pub(crate) fn event_admitted(&self, at: SystemTime) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let mut last = self.last_event_at.lock();
        if last.is_none_or(|prev| prev < at) {
            *last = Some(at);
        }
    }

    pub(crate) fn subscription_created(&self) {
        self.total_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dispatch_queued(&self) {
        self.async_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dispatches_dropped(&self, n: usize) {
        self.dropped_dispatches
            .fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn handler_finished(&self, latency: Duration, fault: Option<&HandlerFault>) {
        self.handler_invocations.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.processing_nanos.fetch_add(nanos, Ordering::Relaxed);
        if let Some(fault) = fault {
            self.handler_errors.fetch_add(1, Ordering::Relaxed);
            if fault.is_panic() {
                self.handler_panics.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn snapshot(&self, active_subscriptions: usize, queue_depth: usize) -> BusMetrics {
        let total_events = self.total_events.load(Ordering::Relaxed);
        let uptime = self.started_at.elapsed();
        BusMetrics {
            total_events,
            active_subscriptions,
            total_subscriptions: self.total_subscriptions.load(Ordering::Relaxed),
            async_dispatches: self.async_dispatches.load(Ordering::Relaxed),
            dropped_dispatches: self.dropped_dispatches.load(Ordering::Relaxed),
            handler_invocations: self.handler_invocations.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
            total_processing_time: Duration::from_nanos(
                self.processing_nanos.load(Ordering::Relaxed),
            ),
            last_event_at: *self.last_event_at.lock(),
            queue_depth,
            uptime,
            events_per_second: per_second(total_events, uptime),
        }
    }
}

/// Average rate of `count` over `elapsed`; `0.0` for an empty window.
fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { count as f64 / secs } else { 0.0 }
}
