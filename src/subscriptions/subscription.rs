//! # Subscriptions: live bindings between a handler and a matching rule.
//!
//! A [`Subscription`] binds one [`Handler`](crate::Handler) to either an exact
//! event type or an [`EventFilter`]. It is created by
//! [`EventBus::subscribe`](crate::EventBus::subscribe) /
//! [`EventBus::subscribe_with_filter`](crate::EventBus::subscribe_with_filter)
//! and is a cheap, cloneable handle onto shared state.
//!
//! ## State machine
//! ```text
//! active ── cancel() / unsubscribe() / bus close ──► cancelled (terminal)
//! ```
//! - Cancellation is idempotent; only the first call removes the subscription
//!   from the registry.
//! - A snapshot taken after `cancel()` returned never contains it; a dispatch
//!   that already took its snapshot may still deliver to it once.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;

use super::registry::Registry;
use super::stats::{StatsCell, SubscriptionStats};
use crate::error::panic_message;
use crate::events::{Event, EventFilter};
use crate::handlers::HandlerRef;

/// Unique subscription id (unique for the lifetime of one bus).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Matching rule of a subscription.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Exact event type.
    Type(Arc<str>),
    /// Content filter, evaluated against every event.
    Filter(EventFilter),
}

impl Matcher {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Matcher::Type(kind) => event.kind() == &**kind,
            Matcher::Filter(filter) => filter.matches(event),
        }
    }
}

/// Shared state behind every [`Subscription`] clone.
pub(crate) struct SubscriptionInner {
    pub(crate) id: SubscriptionId,
    pub(crate) matcher: Matcher,
    pub(crate) handler: HandlerRef,
    /// `Handler::priority` captured at subscribe time.
    pub(crate) priority: i32,
    pub(crate) name: Arc<str>,
    pub(crate) stats: StatsCell,
    active: AtomicBool,
}

impl SubscriptionInner {
    /// `priority` and `name` are read from the handler by the caller, outside
    /// any registry lock.
    pub(crate) fn new(
        id: SubscriptionId,
        matcher: Matcher,
        handler: HandlerRef,
        priority: i32,
        name: Arc<str>,
    ) -> Self {
        Self {
            id,
            matcher,
            handler,
            priority,
            name,
            stats: StatsCell::new(),
            active: AtomicBool::new(true),
        }
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Flips `active → cancelled`; returns `true` only for the call that did it.
    #[inline]
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// Matching rule and `Handler::can_handle`, both evaluated with panics
    /// contained: a panicking predicate counts as "no match".
    pub(crate) fn accepts(&self, event: &Event) -> bool {
        let verdict = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.matcher.matches(event) && self.handler.can_handle(event)
        }));
        match verdict {
            Ok(matched) => matched,
            Err(payload) => {
                tracing::warn!(
                    subscription = %self.id,
                    handler = %self.name,
                    panic = %panic_message(payload.as_ref()),
                    "match predicate panicked; treating as no match"
                );
                false
            }
        }
    }
}

/// Handle to a live (or cancelled) subscription.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub(crate) fn new(inner: Arc<SubscriptionInner>, registry: Weak<Registry>) -> Self {
        Self { inner, registry }
    }

    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    /// Subscribed event type; `None` for filtered subscriptions.
    pub fn event_type(&self) -> Option<&str> {
        match &self.inner.matcher {
            Matcher::Type(kind) => Some(&**kind),
            Matcher::Filter(_) => None,
        }
    }

    /// Filter of a filtered subscription.
    pub fn filter(&self) -> Option<&EventFilter> {
        match &self.inner.matcher {
            Matcher::Type(_) => None,
            Matcher::Filter(filter) => Some(filter),
        }
    }

    #[inline]
    pub fn matcher(&self) -> &Matcher {
        &self.inner.matcher
    }

    /// Dispatch tier (captured from the handler at subscribe time).
    #[inline]
    pub fn priority(&self) -> i32 {
        self.inner.priority
    }

    #[inline]
    pub fn handler_name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Cancels the subscription. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.deactivate() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.inner);
        }
        tracing::debug!(subscription = %self.inner.id, handler = %self.inner.name, "subscription cancelled");
    }

    /// Independent copy of the delivery statistics.
    pub fn stats(&self) -> SubscriptionStats {
        self.inner.stats.snapshot()
    }

    pub(crate) fn belongs_to(&self, registry: &Arc<Registry>) -> bool {
        std::ptr::eq(self.registry.as_ptr(), Arc::as_ptr(registry))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("matcher", &self.inner.matcher)
            .field("handler", &self.inner.name)
            .field("priority", &self.inner.priority)
            .field("active", &self.is_active())
            .finish()
    }
}
