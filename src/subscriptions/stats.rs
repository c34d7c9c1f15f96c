//! Per-subscription delivery statistics.
//!
//! Written only by the dispatcher (one `mark_received` before and one `record`
//! after each handler invocation), read through
//! [`Subscription::stats`](crate::Subscription::stats) as an independent copy.

use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::HandlerFault;

/// Snapshot of one subscription's counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubscriptionStats {
    /// Invocations started.
    pub received: u64,
    /// Invocations that returned `Ok`.
    pub delivered: u64,
    /// Invocations that returned `Err` or panicked.
    pub errors: u64,
    /// Subset of `errors` caused by a panic.
    pub panics: u64,
    /// Cumulative handling latency of finished invocations.
    pub total_latency: Duration,
    /// When the last invocation finished (success or failure).
    pub last_delivery_at: Option<SystemTime>,
    pub created_at: SystemTime,
}

impl SubscriptionStats {
    fn new(created_at: SystemTime) -> Self {
        Self {
            received: 0,
            delivered: 0,
            errors: 0,
            panics: 0,
            total_latency: Duration::ZERO,
            last_delivery_at: None,
            created_at,
        }
    }

    /// Invocations that finished, successfully or not.
    #[inline]
    pub fn finished(&self) -> u64 {
        self.delivered + self.errors
    }

    /// Mean handling latency over finished invocations (`0` if none).
    pub fn average_latency(&self) -> Duration {
        average(self.total_latency, self.finished())
    }
}

pub(crate) fn average(total: Duration, n: u64) -> Duration {
    if n == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / u128::from(n);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Live, lock-protected stats owned by a subscription.
pub(crate) struct StatsCell {
    inner: Mutex<SubscriptionStats>,
}

impl StatsCell {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(SubscriptionStats::new(SystemTime::now())),
        }
    }

    pub(crate) fn mark_received(&self) {
        self.inner.lock().received += 1;
    }

    pub(crate) fn record(&self, latency: Duration, fault: Option<&HandlerFault>) {
        let mut s = self.inner.lock();
        match fault {
            None => s.delivered += 1,
            Some(f) => {
                s.errors += 1;
                if f.is_panic() {
                    s.panics += 1;
                }
            }
        }
        s.total_latency += latency;
        s.last_delivery_at = Some(SystemTime::now());
    }

    pub(crate) fn snapshot(&self) -> SubscriptionStats {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let cell = StatsCell::new();
        for _ in 0..3 {
            cell.mark_received();
        }
        cell.record(Duration::from_millis(10), None);
        cell.record(
            Duration::from_millis(20),
            Some(&HandlerFault::Returned(anyhow::anyhow!("x"))),
        );
        cell.record(
            Duration::from_millis(30),
            Some(&HandlerFault::Panicked("y".into())),
        );

        let s = cell.snapshot();
        assert_eq!(s.received, 3);
        assert_eq!(s.delivered, 1);
        assert_eq!(s.errors, 2);
        assert_eq!(s.panics, 1);
        assert_eq!(s.finished(), 3);
        assert_eq!(s.total_latency, Duration::from_millis(60));
        assert_eq!(s.average_latency(), Duration::from_millis(20));
        assert!(s.last_delivery_at.is_some());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let cell = StatsCell::new();
        let mut copy = cell.snapshot();
        copy.delivered = 99;
        assert_eq!(cell.snapshot().delivered, 0);
        assert_eq!(copy.average_latency(), Duration::ZERO);
    }
}
