//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(CancellationToken, Event) -> Fut`,
//! producing a fresh future per event. The closure receives an owned clone of
//! the event, so the future does not borrow from the dispatcher.
//!
//! By default a `HandlerFn` accepts every event its subscription matched and
//! runs at priority `0`; narrow it with [`HandlerFn::with_filter`] and move it
//! to another tier with [`HandlerFn::with_priority`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use eventvisor::{Event, EventFilter, Handler, HandlerFn, HandlerRef};
//!
//! let h: HandlerRef = Arc::new(
//!     HandlerFn::new("recorder", |_ctx: CancellationToken, ev: Event| async move {
//!         let _ = ev.kind();
//!         Ok::<_, anyhow::Error>(())
//!     })
//!     .with_priority(10)
//!     .with_filter(EventFilter::source("file.watcher")),
//! );
//!
//! assert_eq!(h.name(), "recorder");
//! assert_eq!(h.priority(), 10);
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::events::{Event, EventFilter};
use crate::handlers::handler::Handler;

/// Function-backed handler implementation.
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    priority: i32,
    filter: Option<EventFilter>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler (priority `0`, no extra filter).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            filter: None,
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Replaces the name used in logs, stats and errors.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Restricts `can_handle` to events matching `filter`.
    #[inline]
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(CancellationToken, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, ctx: CancellationToken, event: &Event) -> anyhow::Result<()> {
        (self.f)(ctx, event.clone()).await
    }

    fn can_handle(&self, event: &Event) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(event))
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        &self.name
    }
}
