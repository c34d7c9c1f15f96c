//! # Immutable events published through the bus.
//!
//! An [`Event`] carries a type discriminator (`kind`), an origin (`source`),
//! a typed [`Payload`] and free-form string metadata (correlation ids, run
//! ids, ...). Producers build events with the `with_*` methods; the bus
//! assigns `id` and `timestamp` on admission when the producer did not.
//!
//! Once admitted an event is shared behind an `Arc` and never mutated.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Event, Payload};
//!
//! let ev = Event::new("test.completed")
//!     .with_source("test.runner")
//!     .with_meta("run", "42");
//!
//! assert_eq!(ev.kind(), "test.completed");
//! assert_eq!(ev.source(), "test.runner");
//! assert_eq!(ev.meta("run"), Some("42"));
//! assert!(ev.id().is_none());
//! assert!(matches!(ev.payload(), Payload::Empty));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::catalog::{kind, source};
use super::payload::{ChangeKind, FileChange, Payload, TestCompletion, TestResult, TestStart};

/// Bus event with optional metadata.
///
/// - `id`: unique per publish; assigned by the bus if absent
/// - `timestamp`: wall-clock time; assigned by the bus if absent
/// - `kind`: type discriminator used for exact-type subscriptions
#[derive(Clone, Debug)]
pub struct Event {
    id: Option<Arc<str>>,
    timestamp: Option<SystemTime>,
    kind: Arc<str>,
    source: Arc<str>,
    payload: Payload,
    metadata: BTreeMap<String, String>,
}

impl Event {
    /// Creates an event of the given type with an empty payload.
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self {
            id: None,
            timestamp: None,
            kind: kind.into(),
            source: Arc::from(""),
            payload: Payload::Empty,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets an explicit id (the bus keeps a non-empty one instead of generating its own).
    #[inline]
    pub fn with_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets an explicit timestamp.
    #[inline]
    pub fn with_timestamp(mut self, at: SystemTime) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Attaches the origin of the event.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = source.into();
        self
    }

    /// Attaches the payload.
    #[inline]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Adds one metadata entry (last write wins).
    #[inline]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// `file.changed` from the file watcher.
    pub fn file_changed(path: impl Into<PathBuf>, change: ChangeKind) -> Self {
        Event::new(kind::FILE_CHANGED)
            .with_source(source::FILE_WATCHER)
            .with_payload(Payload::FileChanged(FileChange {
                path: path.into(),
                change,
            }))
    }

    /// `test.started` from the test runner.
    pub fn test_started(name: impl Into<String>, package: impl Into<String>) -> Self {
        Event::new(kind::TEST_STARTED)
            .with_source(source::TEST_RUNNER)
            .with_payload(Payload::TestStarted(TestStart {
                name: name.into(),
                package: package.into(),
            }))
    }

    /// `test.completed` from the test runner.
    pub fn test_completed(result: TestResult, duration: Duration) -> Self {
        Event::new(kind::TEST_COMPLETED)
            .with_source(source::TEST_RUNNER)
            .with_payload(Payload::TestCompleted(TestCompletion { result, duration }))
    }

    /// Event id, `None` until admitted by a bus (or set by the producer).
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Event timestamp, `None` until admitted by a bus (or set by the producer).
    #[inline]
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    /// Type discriminator.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Origin of the event (empty if not set).
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Looks up one metadata value.
    #[inline]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Fills in `id` and `timestamp` if the producer left them empty.
    ///
    /// An empty id counts as missing.
    pub(crate) fn stamped(mut self) -> Self {
        if self.id.as_deref().is_none_or(str::is_empty) {
            self.id = Some(Arc::from(uuid::Uuid::new_v4().to_string()));
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(SystemTime::now());
        }
        self
    }

    pub(crate) fn id_arc(&self) -> Arc<str> {
        self.id.clone().unwrap_or_else(|| Arc::from(""))
    }

    pub(crate) fn kind_arc(&self) -> Arc<str> {
        Arc::clone(&self.kind)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id.as_deref().unwrap_or("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TestStatus;

    #[test]
    fn test_empty_id_is_replaced() {
        let a = Event::new("x").with_id("").stamped();
        let b = Event::new("x").with_id("").stamped();
        let (a, b) = (a.id().unwrap(), b.id().unwrap());
        assert!(!a.is_empty());
        assert!(!b.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_stamping_fills_only_missing_fields() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let ev = Event::new("x").with_id("fixed").with_timestamp(at).stamped();
        assert_eq!(ev.id(), Some("fixed"));
        assert_eq!(ev.timestamp(), Some(at));

        let a = Event::new("x").stamped();
        let b = Event::new("x").stamped();
        assert!(a.id().is_some());
        assert!(a.timestamp().is_some());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_display() {
        assert_eq!(Event::new("file.changed").to_string(), "file.changed:-");
        assert_eq!(
            Event::new("file.changed").with_id("7").to_string(),
            "file.changed:7"
        );
    }

    #[test]
    fn test_convenience_constructors() {
        let ev = Event::file_changed("src/lib.rs", ChangeKind::Modified);
        assert_eq!(ev.kind(), kind::FILE_CHANGED);
        assert_eq!(ev.source(), source::FILE_WATCHER);
        assert_eq!(
            ev.payload().path().map(|p| p.to_string_lossy().into_owned()),
            Some("src/lib.rs".to_string())
        );

        let result = TestResult::new("TestAuth", "auth", TestStatus::Passed);
        let ev = Event::test_completed(result, Duration::from_millis(150));
        assert_eq!(ev.kind(), kind::TEST_COMPLETED);
        assert_eq!(ev.payload().test_status(), Some(TestStatus::Passed));
        assert_eq!(ev.payload().duration(), Some(Duration::from_millis(150)));
    }

    #[test]
    fn test_metadata_last_write_wins() {
        let ev = Event::new("x").with_meta("k", "1").with_meta("k", "2");
        assert_eq!(ev.meta("k"), Some("2"));
        assert_eq!(ev.meta("missing"), None);
        assert_eq!(ev.metadata().len(), 1);
    }
}
