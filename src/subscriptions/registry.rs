//! # Subscription registry.
//!
//! Thread-safe store of every live subscription. Exact-type subscriptions are
//! partitioned by type for O(1) candidate lookup; filtered subscriptions sit
//! in a separate list that is considered for every event.
//!
//! ## Architecture
//! ```text
//! insert / remove / close ──► RwLock (exclusive) ──► RegistryState
//!                                                     ├─ by_type: "test.completed" → [sub-1, sub-4]
//!                                                     │           "file.changed"   → [sub-2]
//!                                                     └─ filtered: [sub-3]
//! snapshot(event) ──► RwLock (shared): clone candidate Arcs ──► unlock
//!                 ──► drop inactive / non-matching (filters + can_handle run unlocked)
//!                 ──► sort: priority desc, then registration order
//! ```
//!
//! ## Rules
//! - No user code (filters, `can_handle`, handlers) ever runs under the lock,
//!   so a handler may publish or subscribe re-entrantly.
//! - Ids are allocated under the write lock, so id order == registration order.
//! - After `close()` the registry is empty and rejects inserts with `Closed`.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::subscription::{Matcher, Subscription, SubscriptionId, SubscriptionInner};
use crate::error::BusError;
use crate::events::Event;
use crate::handlers::HandlerRef;

#[derive(Default)]
struct RegistryState {
    by_type: HashMap<Arc<str>, Vec<Arc<SubscriptionInner>>>,
    filtered: Vec<Arc<SubscriptionInner>>,
    len: usize,
    next_id: u64,
    closed: bool,
}

/// Registry of live subscriptions.
pub(crate) struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(RegistryState::default()),
        })
    }

    /// Registers `handler` under `matcher`.
    pub(crate) fn insert(
        self: &Arc<Self>,
        matcher: Matcher,
        handler: HandlerRef,
    ) -> Result<Subscription, BusError> {
        // Handler methods are user code: read them before taking the lock.
        let priority = handler.priority();
        let name: Arc<str> = Arc::from(handler.name());

        let mut state = self.state.write();
        if state.closed {
            return Err(BusError::Closed);
        }
        state.next_id += 1;
        let id = SubscriptionId::from_raw(state.next_id);
        let inner = Arc::new(SubscriptionInner::new(id, matcher, handler, priority, name));

        match &inner.matcher {
            Matcher::Type(kind) => state
                .by_type
                .entry(Arc::clone(kind))
                .or_default()
                .push(Arc::clone(&inner)),
            Matcher::Filter(_) => state.filtered.push(Arc::clone(&inner)),
        }
        state.len += 1;
        drop(state);

        Ok(Subscription::new(inner, Arc::downgrade(self)))
    }

    /// Removes one subscription; returns `false` if it was not registered.
    pub(crate) fn remove(&self, sub: &SubscriptionInner) -> bool {
        let mut state = self.state.write();
        let removed = match &sub.matcher {
            Matcher::Type(kind) => {
                let (removed, now_empty) = match state.by_type.get_mut(kind) {
                    Some(list) => {
                        let before = list.len();
                        list.retain(|s| s.id != sub.id);
                        (list.len() != before, list.is_empty())
                    }
                    None => (false, false),
                };
                if now_empty {
                    state.by_type.remove(kind);
                }
                removed
            }
            Matcher::Filter(_) => {
                let before = state.filtered.len();
                state.filtered.retain(|s| s.id != sub.id);
                state.filtered.len() != before
            }
        };
        if removed {
            state.len -= 1;
        }
        removed
    }

    /// Active subscriptions matching `event`, in dispatch order.
    pub(crate) fn snapshot(&self, event: &Event) -> Vec<Arc<SubscriptionInner>> {
        let candidates: Vec<Arc<SubscriptionInner>> = {
            let state = self.state.read();
            let typed = state.by_type.get(event.kind());
            let mut out =
                Vec::with_capacity(typed.map_or(0, Vec::len) + state.filtered.len());
            if let Some(list) = typed {
                out.extend(list.iter().cloned());
            }
            out.extend(state.filtered.iter().cloned());
            out
        };

        let mut targets: Vec<_> = candidates
            .into_iter()
            .filter(|s| s.is_active() && s.accepts(event))
            .collect();
        targets.sort_by_key(|s| (Reverse(s.priority), s.id));
        targets
    }

    /// Empties the registry, cancels every subscription and rejects future inserts.
    pub(crate) fn close(&self) -> usize {
        let drained: Vec<Arc<SubscriptionInner>> = {
            let mut state = self.state.write();
            state.closed = true;
            state.len = 0;
            let mut all: Vec<_> = state.by_type.drain().flat_map(|(_, v)| v).collect();
            all.append(&mut state.filtered);
            all
        };
        for sub in &drained {
            sub.deactivate();
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().len
    }
}
