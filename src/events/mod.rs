//! Events: data model and filter engine.
//!
//! ## Contents
//! - [`Event`] immutable message (type, source, timestamp, payload, metadata)
//! - [`Payload`] tagged union of payload shapes, with a dynamic-map fallback
//! - [`EventFilter`] composable predicate for filtered subscriptions
//! - [`kind`] / [`source`] well-known names
//!
//! ## Quick reference
//! - **Producers**: file watcher (`file.changed`), test executor
//!   (`test.started`, `test.completed`), application lifecycle.
//! - **Consumers**: anything registered through
//!   [`EventBus::subscribe`](crate::EventBus::subscribe) /
//!   [`EventBus::subscribe_with_filter`](crate::EventBus::subscribe_with_filter).

mod catalog;
mod event;
mod filter;
mod payload;

pub use catalog::{kind, source};
pub use event::Event;
pub use filter::EventFilter;
pub use payload::{
    ChangeKind, FileChange, Payload, TestCompletion, TestResult, TestStart, TestStatus,
};
