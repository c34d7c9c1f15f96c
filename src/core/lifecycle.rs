//! # Bus lifecycle.
//!
//! ```text
//! Open ── close() ──► Closing ── drained / grace elapsed ──► Closed (terminal)
//! ```
//!
//! Only `Open` admits `subscribe`, `publish*` and `unsubscribe`. Calls already
//! past admission when `close()` starts are allowed to finish.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Observable bus state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusState {
    Open,
    Closing,
    Closed,
}

impl BusState {
    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusState::Open => "open",
            BusState::Closing => "closing",
            BusState::Closed => "closed",
        }
    }
}

/// Outcome of [`EventBus::close`](crate::EventBus::close).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReport {
    /// Every admitted async dispatch finished.
    Drained,
    /// The grace period elapsed first.
    ///
    /// `abandoned` queued dispatches were discarded; handlers still running
    /// were detached and may complete later.
    GraceExceeded { grace: Duration, abandoned: usize },
    /// The bus was already closed (or being closed) by an earlier call.
    AlreadyClosed,
}

impl ShutdownReport {
    pub fn is_drained(&self) -> bool {
        matches!(self, ShutdownReport::Drained)
    }
}

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

pub(crate) struct Lifecycle(AtomicU8);

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(OPEN))
    }

    pub(crate) fn state(&self) -> BusState {
        match self.0.load(Ordering::Acquire) {
            OPEN => BusState::Open,
            CLOSING => BusState::Closing,
            _ => BusState::Closed,
        }
    }

    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire) == OPEN
    }

    /// `Open → Closing`; returns `false` if the bus was not open.
    pub(crate) fn begin_close(&self) -> bool {
        self.0
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish_close(&self) {
        self.0.store(CLOSED, Ordering::Release);
    }
}
