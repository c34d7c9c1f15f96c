//! # Error sink for asynchronous dispatch.
//!
//! [`EventBus::publish_async`](crate::EventBus::publish_async) never returns
//! handler failures to the caller. They are recorded in subscription stats and
//! bus metrics and, if an [`ErrorSink`] is configured through
//! [`EventBusBuilder::with_error_sink`](crate::EventBusBuilder::with_error_sink),
//! reported to it from the dispatch worker.
//!
//! Any `Fn(&HandlerError) + Send + Sync` closure is a sink.

use crate::error::HandlerError;

/// Receiver of asynchronous handler failures.
///
/// Called on a dispatch worker; keep it short and non-blocking. A panicking
/// sink is caught and logged.
pub trait ErrorSink: Send + Sync + 'static {
    fn report(&self, failure: &HandlerError);
}

impl<F> ErrorSink for F
where
    F: Fn(&HandlerError) + Send + Sync + 'static,
{
    fn report(&self, failure: &HandlerError) {
        self(failure)
    }
}
