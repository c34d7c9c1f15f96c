//! # PayloadTally: tolerant test/file counters
//!
//! Ingests `test.started`, `test.completed` and `file.changed` the way the
//! metrics collector and dashboard consume them: it reads the result,
//! duration and path out of the payload and never fails on a payload it
//! cannot read. An absent or mistyped field turns that field into a no-op and
//! bumps the `malformed` counter once for the event.
//!
//! ```text
//! test.completed {result: "pass", duration: 12}   → passed += 1, test_time += 12ms
//! test.completed {result: 17}                      → malformed += 1
//! file.changed   {path: "src/lib.rs"}              → file_changes += 1
//! file.changed   {}                                → malformed += 1
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::events::{Event, TestStatus, kind};
use crate::handlers::Handler;

/// Point-in-time copy of the tally counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TallySnapshot {
    pub tests_started: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub file_changes: u64,
    pub malformed: u64,
    pub test_time: Duration,
}

/// Counting consumer for test and file events.
#[derive(Default)]
pub struct PayloadTally {
    tests_started: AtomicU64,
    passed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    file_changes: AtomicU64,
    malformed: AtomicU64,
    test_time_us: AtomicU64,
}

impl PayloadTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current counters.
    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            tests_started: self.tests_started.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            file_changes: self.file_changes.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            test_time: Duration::from_micros(self.test_time_us.load(Ordering::Relaxed)),
        }
    }

    fn ingest(&self, e: &Event) {
        let payload = e.payload();
        match e.kind() {
            kind::TEST_STARTED => {
                self.tests_started.fetch_add(1, Ordering::Relaxed);
            }
            kind::TEST_COMPLETED => {
                let mut clean = true;
                match payload.test_status() {
                    Some(TestStatus::Passed) => bump(&self.passed),
                    Some(TestStatus::Failed) => bump(&self.failed),
                    Some(TestStatus::Skipped) => bump(&self.skipped),
                    Some(TestStatus::Running) => {}
                    None => clean = false,
                }
                match payload.duration() {
                    Some(d) => {
                        let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
                        self.test_time_us.fetch_add(us, Ordering::Relaxed);
                    }
                    None => clean = false,
                }
                if !clean {
                    bump(&self.malformed);
                }
            }
            kind::FILE_CHANGED => match payload.path() {
                Some(_) => bump(&self.file_changes),
                None => bump(&self.malformed),
            },
            _ => {}
        }
    }
}

#[inline]
fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

#[async_trait]
impl Handler for PayloadTally {
    async fn handle(&self, _ctx: CancellationToken, e: &Event) -> anyhow::Result<()> {
        self.ingest(e);
        Ok(())
    }

    fn can_handle(&self, e: &Event) -> bool {
        matches!(
            e.kind(),
            kind::TEST_STARTED | kind::TEST_COMPLETED | kind::FILE_CHANGED
        )
    }

    fn name(&self) -> &str {
        "PayloadTally"
    }
}
