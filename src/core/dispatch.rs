//! # Deliver one event to an ordered handler snapshot.
//!
//! The [`Dispatcher`] is shared by synchronous publish (runs on the caller's
//! task) and by the async workers (runs [`Job`]s from the dispatch queue).
//!
//! ## Flow
//! ```text
//! targets (priority desc, id asc)
//!   └─► chunk_by(priority) ──► tier 15 ──► tier 10 ──► tier 5 ──► ...
//!                                │
//!                   Sequential:  A → B → C      (registration order)
//!                   Concurrent:  join_all(A, B, C)
//!                                │
//!                   invoke(sub):
//!                     mark_received
//!                     catch_unwind(handler.handle(child ctx, &event))
//!                     record stats + bus counters
//!                     Err → HandlerError (accumulated, never short-circuits)
//! ```
//!
//! ## Rules
//! - A tier completes entirely before the next one starts.
//! - A failing or panicking handler never prevents its siblings from running.
//! - Each invocation gets its own child token of the dispatch context.
//! - No registry lock is held here; handlers may publish or subscribe.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use super::metrics::BusCounters;
use super::pool::Job;
use crate::error::{HandlerError, HandlerFault, panic_message};
use crate::events::Event;
use crate::handlers::ErrorSink;
use crate::policies::TierMode;
use crate::subscriptions::SubscriptionInner;

pub(crate) struct Dispatcher {
    tier_mode: TierMode,
    counters: Arc<BusCounters>,
    sink: Option<Arc<dyn ErrorSink>>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub(crate) fn new(
        tier_mode: TierMode,
        counters: Arc<BusCounters>,
        sink: Option<Arc<dyn ErrorSink>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            tier_mode,
            counters,
            sink,
            shutdown,
        }
    }

    /// Runs every target tier by tier; returns the failures in dispatch order.
    pub(crate) async fn deliver(
        &self,
        event: &Event,
        targets: &[Arc<SubscriptionInner>],
        ctx: &CancellationToken,
    ) -> Vec<HandlerError> {
        let mut failures = Vec::new();

        for tier in targets.chunk_by(|a, b| a.priority == b.priority) {
            match self.tier_mode {
                TierMode::Sequential => {
                    for sub in tier {
                        if let Err(e) = self.invoke(sub, event, ctx).await {
                            failures.push(e);
                        }
                    }
                }
                TierMode::Concurrent => {
                    let outcomes = join_all(tier.iter().map(|sub| self.invoke(sub, event, ctx))).await;
                    failures.extend(outcomes.into_iter().filter_map(Result::err));
                }
            }
        }
        failures
    }

    /// Executes one async job under the bus shutdown context.
    ///
    /// Failures go to stats, bus counters and the error sink; nothing is returned.
    pub(crate) async fn run_job(&self, job: Job) {
        let ctx = self.shutdown.child_token();
        let failures = self.deliver(&job.event, &job.targets, &ctx).await;
        for failure in &failures {
            self.report(failure);
        }
    }

    async fn invoke(
        &self,
        sub: &SubscriptionInner,
        event: &Event,
        ctx: &CancellationToken,
    ) -> Result<(), HandlerError> {
        sub.stats.mark_received();
        let started = Instant::now();

        let fut = sub.handler.handle(ctx.child_token(), event);
        let fault = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(HandlerFault::Returned(e)),
            Err(payload) => Some(HandlerFault::from_panic(payload)),
        };

        let latency = started.elapsed();
        sub.stats.record(latency, fault.as_ref());
        self.counters.handler_finished(latency, fault.as_ref());

        let Some(fault) = fault else {
            tracing::trace!(subscription = %sub.id, handler = %sub.name, ?latency, "handler done");
            return Ok(());
        };
        tracing::warn!(
            subscription = %sub.id,
            handler = %sub.name,
            event_type = event.kind(),
            event_id = event.id().unwrap_or_default(),
            label = fault.as_label(),
            error = %fault,
            "handler failed"
        );
        Err(HandlerError {
            subscription: sub.id,
            handler: Arc::clone(&sub.name),
            event_id: event.id_arc(),
            event_type: event.kind_arc(),
            fault,
        })
    }

    fn report(&self, failure: &HandlerError) {
        let Some(sink) = &self.sink else { return };
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| sink.report(failure))) {
            tracing::warn!(
                subscription = %failure.subscription,
                panic = %panic_message(payload.as_ref()),
                "error sink panicked"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{HandlerFn, HandlerRef};
    use crate::subscriptions::{Matcher, SubscriptionId};
    use parking_lot::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn target(id: u64, priority: i32, log: &Log, fail: bool) -> Arc<SubscriptionInner> {
        let name = format!("h{id}");
        let label: Arc<str> = Arc::from(name.as_str());
        let log = Arc::clone(log);
        let handler: HandlerRef = Arc::new(
            HandlerFn::new(name.clone(), move |_ctx: CancellationToken, _ev: Event| {
                let log = Arc::clone(&log);
                let name = name.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    log.lock().push(name.clone());
                    anyhow::ensure!(!fail, "{name} failed");
                    Ok(())
                }
            })
            .with_priority(priority),
        );
        Arc::new(SubscriptionInner::new(
            SubscriptionId::from_raw(id),
            Matcher::Type("x".into()),
            handler,
            priority,
            label,
        ))
    }

    fn exploding(id: u64, priority: i32) -> Arc<SubscriptionInner> {
        let handler: HandlerRef = Arc::new(HandlerFn::new(
            "boom",
            |_ctx: CancellationToken, _ev: Event| async move {
                if true {
                    panic!("kaboom");
                }
                Ok::<_, anyhow::Error>(())
            },
        ));
        Arc::new(SubscriptionInner::new(
            SubscriptionId::from_raw(id),
            Matcher::Type("x".into()),
            handler,
            priority,
            Arc::from("boom"),
        ))
    }

    fn dispatcher(mode: TierMode) -> (Dispatcher, Arc<BusCounters>) {
        let counters = Arc::new(BusCounters::default());
        let d = Dispatcher::new(mode, Arc::clone(&counters), None, CancellationToken::new());
        (d, counters)
    }

    #[tokio::test]
    async fn test_tiers_run_in_order_and_failures_accumulate() {
        let log: Log = Arc::default();
        let targets = vec![
            target(2, 10, &log, true),
            target(3, 10, &log, false),
            target(1, 5, &log, true),
        ];
        let (d, counters) = dispatcher(TierMode::Sequential);

        let failures = d
            .deliver(&Event::new("x").stamped(), &targets, &CancellationToken::new())
            .await;

        assert_eq!(*log.lock(), vec!["h2", "h3", "h1"]);
        let failed: Vec<u64> = failures.iter().map(|f| f.subscription.as_u64()).collect();
        assert_eq!(failed, vec![2, 1]);
        assert_eq!(targets[1].stats.snapshot().delivered, 1);
        assert_eq!(targets[0].stats.snapshot().errors, 1);

        let m = counters.snapshot(0, 0);
        assert_eq!(m.handler_invocations, 3);
        assert_eq!(m.handler_errors, 2);
    }

    #[tokio::test]
    async fn test_concurrent_tier_still_orders_tiers() {
        let log: Log = Arc::default();
        let targets = vec![
            target(1, 10, &log, false),
            target(2, 10, &log, false),
            target(3, 1, &log, false),
        ];
        let (d, _) = dispatcher(TierMode::Concurrent);

        let failures = d
            .deliver(&Event::new("x").stamped(), &targets, &CancellationToken::new())
            .await;

        assert!(failures.is_empty());
        let log = log.lock();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2], "h3");
    }

    #[tokio::test]
    async fn test_concurrent_tier_reports_every_failure() {
        let log: Log = Arc::default();
        let targets = vec![
            target(1, 10, &log, true),
            exploding(2, 10),
            target(3, 10, &log, false),
            target(4, 1, &log, false),
        ];
        let (d, counters) = dispatcher(TierMode::Concurrent);

        let failures = d
            .deliver(&Event::new("x").stamped(), &targets, &CancellationToken::new())
            .await;

        let failed: Vec<u64> = failures.iter().map(|f| f.subscription.as_u64()).collect();
        assert_eq!(failed, vec![1, 2]);
        assert!(!failures[0].fault.is_panic());
        assert!(failures[1].fault.is_panic());

        let log = log.lock();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2], "h4");

        let m = counters.snapshot(0, 0);
        assert_eq!(m.handler_invocations, 4);
        assert_eq!(m.handler_errors, 2);
        assert_eq!(m.handler_panics, 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_fault_and_reaches_sink() {
        let sub = exploding(7, 0);

        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink_seen = Arc::clone(&seen);
        let counters = Arc::new(BusCounters::default());
        let d = Dispatcher::new(
            TierMode::Sequential,
            Arc::clone(&counters),
            Some(Arc::new(move |e: &HandlerError| {
                sink_seen.lock().push(e.to_string());
            })),
            CancellationToken::new(),
        );

        d.run_job(Job {
            event: Arc::new(Event::new("x").with_id("e1")),
            targets: vec![Arc::clone(&sub)],
        })
        .await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("sub-7"));
        assert!(seen[0].contains("kaboom"));
        assert_eq!(sub.stats.snapshot().panics, 1);
        assert_eq!(counters.snapshot(0, 0).handler_panics, 1);
    }

    fn exploding_sink(_failure: &HandlerError) {
        panic!("sink down");
    }

    #[tokio::test]
    async fn test_panicking_sink_is_contained() {
        let log: Log = Arc::default();
        let counters = Arc::new(BusCounters::default());
        let d = Dispatcher::new(
            TierMode::Sequential,
            counters,
            Some(Arc::new(exploding_sink)),
            CancellationToken::new(),
        );

        d.run_job(Job {
            event: Arc::new(Event::new("x").stamped()),
            targets: vec![target(1, 0, &log, true), target(2, 0, &log, false)],
        })
        .await;

        assert_eq!(*log.lock(), vec!["h1", "h2"]);
    }
}
