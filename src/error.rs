//! Error types used by the event bus and its dispatcher.
//!
//! - [`BusError`]: everything a caller of the bus API can observe.
//! - [`DispatchError`]: aggregate of every handler that failed during one
//!   synchronous [`publish`](crate::EventBus::publish).
//! - [`HandlerError`]: one failed handler invocation, attributed to a
//!   subscription.
//! - [`HandlerFault`]: what actually went wrong inside the handler.
//!
//! All of them provide `as_label` for logs/metrics.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::subscriptions::SubscriptionId;

/// # Errors returned by the bus API.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// The call was rejected before doing anything (empty event type, foreign subscription, ...).
    #[error("validation failed: {reason}")]
    Validation {
        /// Why the input was rejected.
        reason: &'static str,
    },

    /// The bus is closing or closed; no new work is admitted.
    #[error("event bus is closed")]
    Closed,

    /// Async admission was rejected because the dispatch queue is full
    /// (only with [`OverflowPolicy::Reject`](crate::OverflowPolicy::Reject)).
    #[error("async dispatch queue saturated (capacity {capacity})")]
    QueueSaturated {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// One or more handlers failed during a synchronous publish.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::BusError;
    ///
    /// assert_eq!(BusError::Closed.as_label(), "bus_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Validation { .. } => "bus_validation",
            BusError::Closed => "bus_closed",
            BusError::QueueSaturated { .. } => "bus_queue_saturated",
            BusError::Dispatch(_) => "bus_dispatch_failed",
        }
    }

    /// True for [`BusError::Closed`].
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, BusError::Closed)
    }

    /// Returns the aggregated handler failures, if this is a dispatch error.
    pub fn as_dispatch(&self) -> Option<&DispatchError> {
        match self {
            BusError::Dispatch(d) => Some(d),
            _ => None,
        }
    }
}

/// # What went wrong inside a handler.
#[derive(Error, Debug)]
pub enum HandlerFault {
    /// The handler returned an error.
    #[error("{0:#}")]
    Returned(anyhow::Error),

    /// The handler panicked; the panic was caught by the dispatcher.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl HandlerFault {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerFault::Returned(_) => "handler_failed",
            HandlerFault::Panicked(_) => "handler_panicked",
        }
    }

    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self, HandlerFault::Panicked(_))
    }

    /// Converts a caught panic payload into a fault.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        HandlerFault::Panicked(panic_message(payload.as_ref()))
    }
}

/// Extracts the message of a panic payload (`&str` / `String`), or `"unknown panic"`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # One failed handler invocation.
#[derive(Error, Debug)]
#[error("subscription {subscription} ({handler}) failed on {event_type}#{event_id}: {fault}")]
pub struct HandlerError {
    /// Subscription whose handler failed.
    pub subscription: SubscriptionId,
    /// Handler name as reported by [`Handler::name`](crate::Handler::name).
    pub handler: Arc<str>,
    /// Id of the event being handled.
    pub event_id: Arc<str>,
    /// Type of the event being handled.
    pub event_type: Arc<str>,
    /// Underlying cause.
    #[source]
    pub fault: HandlerFault,
}

impl HandlerError {
    /// Returns the label of the underlying fault.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        self.fault.as_label()
    }
}

/// # Aggregate of every handler failure of one synchronous publish.
///
/// The dispatcher still runs every matching handler; this error only
/// collects those that failed, in dispatch order.
#[derive(Error, Debug)]
#[error("{} handler(s) failed: {}", .failures.len(), summarize(.failures))]
pub struct DispatchError {
    /// Individual failures in dispatch order.
    pub failures: Vec<HandlerError>,
}

impl DispatchError {
    /// Ids of every failing subscription, in dispatch order.
    pub fn failed_subscriptions(&self) -> Vec<SubscriptionId> {
        self.failures.iter().map(|f| f.subscription).collect()
    }

    /// Number of failed invocations.
    #[inline]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Iterates over the individual failures.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerError> {
        self.failures.iter()
    }
}

fn summarize(failures: &[HandlerError]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.subscription, f.fault))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(id: u64, fault: HandlerFault) -> HandlerError {
        HandlerError {
            subscription: SubscriptionId::from_raw(id),
            handler: Arc::from("h"),
            event_id: Arc::from("e-1"),
            event_type: Arc::from("x"),
            fault,
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            BusError::Validation { reason: "empty" }.as_label(),
            "bus_validation"
        );
        assert_eq!(
            BusError::QueueSaturated { capacity: 8 }.as_label(),
            "bus_queue_saturated"
        );
        assert_eq!(
            HandlerFault::Panicked("boom".into()).as_label(),
            "handler_panicked"
        );
        assert_eq!(
            HandlerFault::Returned(anyhow::anyhow!("nope")).as_label(),
            "handler_failed"
        );
    }

    #[test]
    fn test_dispatch_error_lists_every_subscription() {
        let err = DispatchError {
            failures: vec![
                failure(3, HandlerFault::Returned(anyhow::anyhow!("disk full"))),
                failure(7, HandlerFault::Panicked("index out of bounds".into())),
            ],
        };
        assert_eq!(
            err.failed_subscriptions(),
            vec![SubscriptionId::from_raw(3), SubscriptionId::from_raw(7)]
        );

        let text = err.to_string();
        assert!(text.starts_with("2 handler(s) failed"), "{text}");
        assert!(text.contains("sub-3: disk full"), "{text}");
        assert!(text.contains("sub-7: panicked: index out of bounds"), "{text}");
    }

    #[test]
    fn test_panic_payloads() {
        let caught = std::panic::catch_unwind(|| -> u8 { panic!("static message") }).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "static message");

        let caught = std::panic::catch_unwind(|| -> u8 { panic!("formatted {}", 7) }).unwrap_err();
        let fault = HandlerFault::from_panic(caught);
        assert_eq!(fault.to_string(), "panicked: formatted 7");

        let caught = std::panic::catch_unwind(|| -> u8 { std::panic::panic_any(42_u8) }).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "unknown panic");
    }

    #[test]
    fn test_bus_error_wraps_dispatch() {
        let err: BusError = DispatchError {
            failures: vec![failure(1, HandlerFault::Panicked("x".into()))],
        }
        .into();
        assert_eq!(err.as_label(), "bus_dispatch_failed");
        assert_eq!(err.as_dispatch().map(DispatchError::len), Some(1));
        assert!(!err.is_closed());
    }
}
