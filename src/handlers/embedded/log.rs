//! # LogHandler: structured event logger
//!
//! A minimal handler that writes one `tracing` record per event. Subscribe it
//! with an [`EventFilter::Any`](crate::EventFilter::Any) filter to trace
//! everything, or to a single type.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO eventvisor::events: [file-changed] id=4f0c.. source=file.watcher path="src/lib.rs"
//! INFO eventvisor::events: [test-completed] id=91ab.. source=test.runner status=Some(Passed) duration=Some(150ms)
//! INFO eventvisor::events: [test-started] id=77d2.. source=test.runner
//! INFO eventvisor::events: [event] id=0c1e.. event_type=cache.hit source=cache.manager
//! ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::events::{Event, kind};
use crate::handlers::{Handler, priority};

/// Event logging handler.
#[derive(Default)]
pub struct LogHandler;

impl LogHandler {
    /// Construct a new [`LogHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for LogHandler {
    async fn handle(&self, _ctx: CancellationToken, e: &Event) -> anyhow::Result<()> {
        let id = e.id().unwrap_or("-");
        match e.kind() {
            kind::FILE_CHANGED => {
                tracing::info!(
                    target: "eventvisor::events",
                    id, source = e.source(), path = ?e.payload().path(),
                    "[file-changed]"
                );
            }
            kind::TEST_STARTED => {
                tracing::info!(target: "eventvisor::events", id, source = e.source(), "[test-started]");
            }
            kind::TEST_COMPLETED => {
                tracing::info!(
                    target: "eventvisor::events",
                    id, source = e.source(),
                    status = ?e.payload().test_status(),
                    duration = ?e.payload().duration(),
                    "[test-completed]"
                );
            }
            other => {
                tracing::info!(
                    target: "eventvisor::events",
                    id, event_type = other, source = e.source(),
                    "[event]"
                );
            }
        }
        Ok(())
    }

    fn priority(&self) -> i32 {
        priority::LOW
    }

    fn name(&self) -> &str {
        "LogHandler"
    }
}
