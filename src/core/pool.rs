//! # Bounded async dispatch pool.
//!
//! `publish_async` never runs handlers itself. It admits a [`Job`] (the event
//! plus its ordered handler snapshot) into a bounded [`DispatchQueue`]; a fixed
//! set of worker tasks, spawned once when the bus is built, drains it.
//!
//! ## Architecture
//! ```text
//! publish_async(ev) ──► push(Job) ──► [ queue: capacity N ] ──► worker 1 ──► Dispatcher::run_job
//!                        │                                 ├──► worker 2 ──► ...
//!                        │ full?                           └──► worker W
//!                        ├─ Reject      → QueueSaturated
//!                        ├─ DropOldest  → evict front, admit
//!                        └─ Block       → await `space`
//! ```
//!
//! ## Rules
//! - **Bounded**: never more than `capacity` jobs wait; workers never grow.
//! - **FIFO admission**: workers take jobs in admission order; with W > 1 two
//!   jobs may run concurrently, so there is no cross-event ordering.
//! - **Close**: `close()` refuses new jobs and wakes everyone; workers keep
//!   draining what was admitted, then exit. `abandon()` discards the rest.
//! - Waiters register interest (`Notified::enable`) before checking the queue,
//!   so a notification between check and await is never lost.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::dispatch::Dispatcher;
use crate::error::BusError;
use crate::events::Event;
use crate::policies::OverflowPolicy;
use crate::subscriptions::SubscriptionInner;

/// One admitted async dispatch.
pub(crate) struct Job {
    pub(crate) event: Arc<Event>,
    pub(crate) targets: Vec<Arc<SubscriptionInner>>,
}

enum Rejected {
    Full(Job),
    Closed,
}

pub(crate) struct DispatchQueue {
    jobs: Mutex<VecDeque<Job>>,
    capacity: usize,
    policy: OverflowPolicy,
    closed: AtomicBool,
    running: AtomicUsize,
    ready: Notify,
    space: Notify,
}

impl DispatchQueue {
    pub(crate) fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            jobs: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
            policy,
            closed: AtomicBool::new(false),
            running: AtomicUsize::new(0),
            ready: Notify::new(),
            space: Notify::new(),
        }
    }

    /// Admits `job` according to the overflow policy.
    ///
    /// Returns the evicted job under `DropOldest`. Only `Block` ever awaits.
    pub(crate) async fn push(&self, job: Job) -> Result<Option<Job>, BusError> {
        let mut job = job;
        loop {
            let mut space = pin!(self.space.notified());
            space.as_mut().enable();

            match self.try_push(job) {
                Ok(evicted) => return Ok(evicted),
                Err(Rejected::Closed) => return Err(BusError::Closed),
                Err(Rejected::Full(back)) if self.policy == OverflowPolicy::Block => {
                    job = back;
                    space.await;
                }
                Err(Rejected::Full(_)) => {
                    return Err(BusError::QueueSaturated {
                        capacity: self.capacity,
                    });
                }
            }
        }
    }

    fn try_push(&self, job: Job) -> Result<Option<Job>, Rejected> {
        let mut jobs = self.jobs.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(Rejected::Closed);
        }
        let evicted = if jobs.len() < self.capacity {
            None
        } else if self.policy == OverflowPolicy::DropOldest {
            jobs.pop_front()
        } else {
            return Err(Rejected::Full(job));
        };
        jobs.push_back(job);
        drop(jobs);

        self.ready.notify_one();
        Ok(evicted)
    }

    /// Next job, or `None` once the queue is closed and empty.
    ///
    /// A returned job counts as running until [`finished`](Self::finished).
    pub(crate) async fn pop(&self) -> Option<Job> {
        loop {
            let mut ready = pin!(self.ready.notified());
            ready.as_mut().enable();
            {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.pop_front() {
                    self.running.fetch_add(1, Ordering::AcqRel);
                    drop(jobs);
                    self.space.notify_one();
                    return Some(job);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            ready.await;
        }
    }

    #[inline]
    pub(crate) fn finished(&self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }

    /// Refuses new jobs and wakes all waiters.
    pub(crate) fn close(&self) {
        {
            let _jobs = self.jobs.lock();
            self.closed.store(true, Ordering::Release);
        }
        self.ready.notify_waiters();
        self.space.notify_waiters();
    }

    /// Discards every queued job; returns how many were dropped.
    pub(crate) fn abandon(&self) -> usize {
        let dropped: Vec<Job> = self.jobs.lock().drain(..).collect();
        dropped.len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Jobs taken by a worker and not yet finished.
    pub(crate) fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Spawns `count` workers draining `queue` through `dispatcher`.
///
/// Must be called within a Tokio runtime.
pub(crate) fn spawn_workers(
    count: usize,
    queue: &Arc<DispatchQueue>,
    dispatcher: &Arc<Dispatcher>,
) -> Vec<JoinHandle<()>> {
    (0..count.max(1))
        .map(|worker| {
            let queue = Arc::clone(queue);
            let dispatcher = Arc::clone(dispatcher);
            tokio::spawn(async move {
                while let Some(job) = queue.pop().await {
                    dispatcher.run_job(job).await;
                    queue.finished();
                }
                tracing::trace!(worker, "dispatch worker stopped");
            })
        })
        .collect()
}
