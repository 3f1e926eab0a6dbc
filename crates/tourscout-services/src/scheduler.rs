//! Poll scheduler. At most one pending timer per search token.
//!
//! Timers are spawned Tokio tasks that sleep, then run their action. Their
//! abort handles live in a map owned by the scheduler (token → slot), so
//! installing a new timer for a token aborts the old one and a cancel can
//! clear it. When a timer fires it re-checks its ticket against the session
//! store before running anything; stale timers end silently.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::AbortHandle;

use tourscout_core::session::SearchToken;

use crate::state::{SearchTicket, SessionStore};

struct TimerSlot {
    /// Distinguishes this timer from a later one installed for the same token.
    seq: u64,
    handle: AbortHandle,
}

#[derive(Clone)]
pub struct PollScheduler {
    timers: Arc<DashMap<SearchToken, TimerSlot>>,
    next_seq: Arc<AtomicU64>,
    store: SessionStore,
}

impl PollScheduler {
    pub fn new(store: SessionStore) -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
            store,
        }
    }

    /// Run `action` after `delay` on behalf of `ticket`, replacing any timer
    /// still pending for the same token.
    ///
    /// The action only runs if the ticket is still current when the timer fires.
    pub fn schedule<F>(&self, ticket: SearchTicket, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let timers = self.timers.clone();
        let store = self.store.clone();

        tracing::debug!(
            token = %ticket.token,
            delay_ms = delay.as_millis() as u64,
            "poll scheduled"
        );

        // Hold the slot while spawning so the timer can't fire and look for
        // its slot before it exists.
        let entry = self.timers.entry(ticket.token.clone());
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            timers.remove_if(&ticket.token, |_, slot| slot.seq == seq);

            if !store.is_current(&ticket) {
                tracing::debug!(token = %ticket.token, "timer fired for inactive search, dropped");
                return;
            }
            action.await;
        });

        let new_slot = TimerSlot {
            seq,
            handle: task.abort_handle(),
        };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(new_slot);
                previous.handle.abort();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(new_slot);
            }
        }
    }

    /// Abort the pending timer for `token`, if any. Returns whether one existed.
    pub fn clear(&self, token: &SearchToken) -> bool {
        match self.timers.remove(token) {
            Some((_, slot)) => {
                slot.handle.abort();
                tracing::debug!(token = %token, "pending poll cleared");
                true
            }
            None => false,
        }
    }

    /// Whether a timer is pending for `token`.
    pub fn is_pending(&self, token: &SearchToken) -> bool {
        self.timers.contains_key(token)
    }

    /// Number of pending timers across all tokens.
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }
}
