//! # Event payloads.
//!
//! [`Payload`] is a tagged union of the payload shapes the known producers
//! emit (file watcher, test executor) plus a [`Payload::Fields`] escape hatch
//! holding a loosely-typed JSON map for everything else.
//!
//! Consumers read payloads through the accessors ([`Payload::path`],
//! [`Payload::test_status`], [`Payload::duration`], ...). They work for both
//! the typed variants and the dynamic map, and return `None` on an absent or
//! mistyped field instead of failing.
//!
//! ## Dynamic map conventions
//! | key        | accepted shapes                                        |
//! |------------|--------------------------------------------------------|
//! | `path`     | string                                                 |
//! | `result`   | status string (`"pass"`, `"failed"`, ...) or an object with a `status` string |
//! | `duration` | integer milliseconds                                   |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

/// Payload attached to an [`Event`](crate::Event).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Payload {
    /// No payload.
    #[default]
    Empty,
    /// `file.changed`
    FileChanged(FileChange),
    /// `test.started`
    TestStarted(TestStart),
    /// `test.completed`
    TestCompleted(TestCompletion),
    /// Loosely-typed fields for extension event types.
    Fields(Map<String, Value>),
}

/// Kind of filesystem change reported by the watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Renamed,
}

impl ChangeKind {
    /// Parses the watcher's textual change type (`"created"`, `"write"`, `"deleted"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "created" | "create" => Some(ChangeKind::Created),
            "modified" | "modify" | "write" => Some(ChangeKind::Modified),
            "removed" | "remove" | "deleted" | "delete" => Some(ChangeKind::Removed),
            "renamed" | "rename" => Some(ChangeKind::Renamed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub change: ChangeKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestStart {
    pub name: String,
    pub package: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestCompletion {
    pub result: TestResult,
    /// Wall time of the whole run that produced `result`.
    pub duration: Duration,
}

/// Outcome of one test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Running,
}

impl TestStatus {
    /// Parses the status spellings used by test runners.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pass" | "passed" | "ok" => Some(TestStatus::Passed),
            "fail" | "failed" => Some(TestStatus::Failed),
            "skip" | "skipped" => Some(TestStatus::Skipped),
            "run" | "running" => Some(TestStatus::Running),
            _ => None,
        }
    }
}

/// Result of a single test as reported by the executor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestResult {
    pub id: String,
    pub name: String,
    pub package: String,
    pub status: TestStatus,
    pub duration: Duration,
    /// Failure message, if the test failed.
    pub error: Option<String>,
}

impl TestResult {
    /// Creates a result with id `package/name` and zero duration.
    pub fn new(name: impl Into<String>, package: impl Into<String>, status: TestStatus) -> Self {
        let name = name.into();
        let package = package.into();
        Self {
            id: format!("{package}/{name}"),
            name,
            package,
            status,
            duration: Duration::ZERO,
            error: None,
        }
    }

    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration = d;
        self
    }

    #[inline]
    pub fn with_error(mut self, err: impl Into<String>) -> Self {
        self.error = Some(err.into());
        self
    }
}

impl Payload {
    /// Builds a [`Payload::Fields`] from `(key, value)` pairs.
    pub fn fields<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Payload::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Raw dynamic field (only for [`Payload::Fields`]).
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Payload::Fields(map) => map.get(key),
            _ => None,
        }
    }

    /// Dynamic field as a string; `None` if absent or not a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Path of a file change.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Payload::FileChanged(fc) => Some(fc.path.as_path()),
            Payload::Fields(_) => self.field_str("path").map(Path::new),
            _ => None,
        }
    }

    /// Status of a completed test.
    pub fn test_status(&self) -> Option<TestStatus> {
        match self {
            Payload::TestCompleted(tc) => Some(tc.result.status),
            Payload::Fields(_) => match self.field("result")? {
                Value::String(s) => TestStatus::parse(s),
                Value::Object(obj) => obj.get("status")?.as_str().and_then(TestStatus::parse),
                _ => None,
            },
            _ => None,
        }
    }

    /// Full typed result (only for [`Payload::TestCompleted`]).
    pub fn test_result(&self) -> Option<&TestResult> {
        match self {
            Payload::TestCompleted(tc) => Some(&tc.result),
            _ => None,
        }
    }

    /// Duration of a completed test run.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Payload::TestCompleted(tc) => Some(tc.duration),
            Payload::Fields(_) => self
                .field("duration")
                .and_then(Value::as_u64)
                .map(Duration::from_millis),
            _ => None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}
