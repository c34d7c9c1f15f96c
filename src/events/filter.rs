//! # Filter engine for content-filtered subscriptions.
//!
//! [`EventFilter`] is a composable predicate over an event's type, source and
//! metadata. A subscription created with
//! [`EventBus::subscribe_with_filter`](crate::EventBus::subscribe_with_filter)
//! has no fixed type: its filter is evaluated against every published event.
//!
//! ## Composition
//! ```text
//! EventFilter::kind("test.completed")
//!     .and(EventFilter::source("test.runner").or(EventFilter::source("ci")))
//!     .and(EventFilter::has_meta("run").negate())
//!
//! renders as: (type == test.completed && (source == test.runner || source == ci) && !(has meta run))
//! ```
//!
//! ## Rules
//! - Evaluation is pure; it never mutates the event.
//! - `And([])` matches everything, `Or([])` matches nothing.
//! - [`EventFilter::predicate`] runs user code; it must be cheap and must not
//!   touch the bus.

use std::fmt;
use std::sync::Arc;

use crate::events::Event;

type PredicateFn = dyn Fn(&Event) -> bool + Send + Sync;

/// Composable predicate over events.
#[derive(Clone)]
pub enum EventFilter {
    /// Matches every event.
    Any,
    /// Exact event type.
    Type(Arc<str>),
    /// Event type starting with the prefix (e.g. `"test."`).
    TypePrefix(Arc<str>),
    /// Exact event source.
    Source(Arc<str>),
    /// Metadata entry `key` equal to `value`.
    Metadata { key: Arc<str>, value: Arc<str> },
    /// Metadata entry `key` present (any value).
    HasMetadata(Arc<str>),
    /// All children match.
    And(Vec<EventFilter>),
    /// At least one child matches.
    Or(Vec<EventFilter>),
    /// Child does not match.
    Not(Box<EventFilter>),
    /// Arbitrary user predicate; `label` is used for display.
    Predicate { label: Arc<str>, f: Arc<PredicateFn> },
}

impl EventFilter {
    pub fn kind(kind: impl Into<Arc<str>>) -> Self {
        EventFilter::Type(kind.into())
    }

    pub fn kind_prefix(prefix: impl Into<Arc<str>>) -> Self {
        EventFilter::TypePrefix(prefix.into())
    }

    pub fn source(source: impl Into<Arc<str>>) -> Self {
        EventFilter::Source(source.into())
    }

    pub fn meta(key: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        EventFilter::Metadata {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn has_meta(key: impl Into<Arc<str>>) -> Self {
        EventFilter::HasMetadata(key.into())
    }

    /// Wraps a closure as a filter.
    pub fn predicate<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        EventFilter::Predicate {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    /// Conjunction; flattens nested `And`s.
    pub fn and(self, other: EventFilter) -> Self {
        match self {
            EventFilter::And(mut all) => {
                all.push(other);
                EventFilter::And(all)
            }
            first => EventFilter::And(vec![first, other]),
        }
    }

    /// Disjunction; flattens nested `Or`s.
    pub fn or(self, other: EventFilter) -> Self {
        match self {
            EventFilter::Or(mut any) => {
                any.push(other);
                EventFilter::Or(any)
            }
            first => EventFilter::Or(vec![first, other]),
        }
    }

    /// Negation; `negate` of a `Not` unwraps it.
    pub fn negate(self) -> Self {
        match self {
            EventFilter::Not(inner) => *inner,
            other => EventFilter::Not(Box::new(other)),
        }
    }

    /// Evaluates the filter against `event`.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Type(k) => event.kind() == &**k,
            EventFilter::TypePrefix(p) => event.kind().starts_with(&**p),
            EventFilter::Source(s) => event.source() == &**s,
            EventFilter::Metadata { key, value } => event.meta(key) == Some(&**value),
            EventFilter::HasMetadata(key) => event.meta(key).is_some(),
            EventFilter::And(all) => all.iter().all(|f| f.matches(event)),
            EventFilter::Or(any) => any.iter().any(|f| f.matches(event)),
            EventFilter::Not(inner) => !inner.matches(event),
            EventFilter::Predicate { f, .. } => f(event),
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFilter::Any => f.write_str("*"),
            EventFilter::Type(k) => write!(f, "type == {k}"),
            EventFilter::TypePrefix(p) => write!(f, "type ^= {p}"),
            EventFilter::Source(s) => write!(f, "source == {s}"),
            EventFilter::Metadata { key, value } => write!(f, "meta[{key}] == {value}"),
            EventFilter::HasMetadata(key) => write!(f, "has meta {key}"),
            EventFilter::And(all) => write_joined(f, all, " && "),
            EventFilter::Or(any) => write_joined(f, any, " || "),
            EventFilter::Not(inner) => write!(f, "!({inner})"),
            EventFilter::Predicate { label, .. } => write!(f, "fn {label}"),
        }
    }
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventFilter({self})")
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[EventFilter], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{part}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: &str, source: &str) -> Event {
        Event::new(kind.to_string()).with_source(source.to_string())
    }

    #[test]
    fn test_leaf_filters() {
        let e = ev("test.completed", "watcher").with_meta("run", "7");
        assert!(EventFilter::Any.matches(&e));
        assert!(EventFilter::kind("test.completed").matches(&e));
        assert!(!EventFilter::kind("test").matches(&e));
        assert!(EventFilter::kind_prefix("test.").matches(&e));
        assert!(EventFilter::source("watcher").matches(&e));
        assert!(!EventFilter::source("executor").matches(&e));
        assert!(EventFilter::meta("run", "7").matches(&e));
        assert!(!EventFilter::meta("run", "8").matches(&e));
        assert!(EventFilter::has_meta("run").matches(&e));
        assert!(!EventFilter::has_meta("user").matches(&e));
    }

    #[test]
    fn test_composition() {
        let f = EventFilter::kind_prefix("test.")
            .and(EventFilter::source("runner").or(EventFilter::source("ci")))
            .and(EventFilter::has_meta("skip").negate());

        assert!(f.matches(&ev("test.started", "ci")));
        assert!(!f.matches(&ev("test.started", "watcher")));
        assert!(!f.matches(&ev("file.changed", "runner")));
        assert!(!f.matches(&ev("test.started", "runner").with_meta("skip", "1")));
    }

    #[test]
    fn test_empty_groups() {
        let e = ev("x", "y");
        assert!(EventFilter::And(vec![]).matches(&e));
        assert!(!EventFilter::Or(vec![]).matches(&e));
    }

    #[test]
    fn test_double_negation_unwraps() {
        let f = EventFilter::source("a").negate().negate();
        assert!(matches!(f, EventFilter::Source(_)));
    }

    #[test]
    fn test_predicate_and_display() {
        let f = EventFilter::kind("a")
            .and(EventFilter::predicate("has_payload", |e: &Event| !e.payload().is_empty()))
            .or(EventFilter::meta("k", "v").negate());
        assert_eq!(
            f.to_string(),
            "((type == a && fn has_payload) || !(meta[k] == v))"
        );
        assert!(f.matches(&ev("b", "s")));
        assert!(!f.matches(&ev("a", "s").with_meta("k", "v")));
    }
}
