use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::bus::EventBus;
use super::config::BusConfig;
use super::dispatch::Dispatcher;
use super::metrics::BusCounters;
use super::pool::{DispatchQueue, spawn_workers};
use crate::handlers::ErrorSink;
use crate::subscriptions::Registry;

/// Builder for constructing an [`EventBus`] with optional features.
pub struct EventBusBuilder {
    cfg: BusConfig,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl EventBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self { cfg, sink: None }
    }

    /// Sets the receiver of async handler failures.
    ///
    /// Without a sink, async failures are only visible in subscription stats,
    /// bus metrics and `warn!` logs.
    pub fn with_error_sink(mut self, sink: impl ErrorSink) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Builds the bus and spawns its dispatch workers.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> Arc<EventBus> {
        let shutdown = CancellationToken::new();
        let counters = Arc::new(BusCounters::default());
        let queue = Arc::new(DispatchQueue::new(
            self.cfg.queue_capacity_clamped(),
            self.cfg.overflow,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            self.cfg.tier_mode,
            Arc::clone(&counters),
            self.sink,
            shutdown.clone(),
        ));
        let workers = spawn_workers(self.cfg.workers_clamped(), &queue, &dispatcher);

        tracing::debug!(
            workers = workers.len(),
            queue_capacity = queue.capacity(),
            overflow = self.cfg.overflow.as_label(),
            "event bus started"
        );

        Arc::new(EventBus::new_internal(
            self.cfg,
            Registry::new(),
            dispatcher,
            queue,
            counters,
            shutdown,
            workers,
        ))
    }
}
