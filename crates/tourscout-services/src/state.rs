//! Session store: the presented search session plus the active-search guard.
//!
//! Every asynchronous continuation carries a `SearchTicket` naming the search
//! it was issued for. The store only applies a write when that ticket is still
//! the active, uncancelled search, and it checks and writes under one lock so
//! a concurrent `begin` can never slip between the two.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

use tourscout_core::session::{SearchSession, SearchStatus, SearchToken};

/// Identity of one search generation, captured by each continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub token: SearchToken,
    pub country_id: String,
    /// When `start_search` was called for this generation.
    pub started_at: Instant,
}

/// Result of starting a new generation.
#[derive(Debug, Clone)]
pub struct Begun {
    pub generation: u64,
    pub started_at: Instant,
    /// Token of the search this one replaced, if it was still running.
    pub superseded: Option<SearchToken>,
}

#[derive(Debug)]
struct ActiveSearch {
    generation: u64,
    token: Option<SearchToken>,
    cancelled: bool,
}

impl ActiveSearch {
    fn matches(&self, ticket: &SearchTicket) -> bool {
        !self.cancelled
            && self.generation == ticket.generation
            && self.token.as_ref() == Some(&ticket.token)
    }
}

/// Owner of the presented session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    active: Arc<Mutex<ActiveSearch>>,
    published: Arc<watch::Sender<SearchSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SearchSession::default());
        Self {
            active: Arc::new(Mutex::new(ActiveSearch {
                generation: 0,
                token: None,
                cancelled: false,
            })),
            published: Arc::new(tx),
        }
    }

    /// Start a new generation. The previous search, whatever its state,
    /// stops being active.
    pub fn begin(&self, country_id: &str) -> Begun {
        let mut active = self.active.lock();
        let previous_running = !self.published.borrow().status.is_terminal() && !active.cancelled;
        let superseded = active.token.take().filter(|_| previous_running);

        active.generation += 1;
        active.cancelled = false;
        let begun = Begun {
            generation: active.generation,
            started_at: Instant::now(),
            superseded,
        };
        self.published
            .send_replace(SearchSession::initiating(country_id));
        begun
    }

    /// Record the token issued for `begun`. Returns `None` when a newer
    /// search started while the initiate call was in flight.
    pub fn activate(
        &self,
        begun: &Begun,
        token: SearchToken,
        country_id: &str,
    ) -> Option<SearchTicket> {
        let mut active = self.active.lock();
        if active.generation != begun.generation || active.cancelled {
            tracing::debug!(token = %token, "initiate response for superseded search dropped");
            return None;
        }
        let current = self.published.borrow().status;
        if !current.can_transition_to(SearchStatus::Waiting) {
            tracing::warn!(from = %current, "cannot activate search from this state");
            return None;
        }

        active.token = Some(token.clone());
        self.published.send_modify(|s| s.mark_waiting(&token));
        Some(SearchTicket {
            generation: begun.generation,
            token,
            country_id: country_id.to_string(),
            started_at: begun.started_at,
        })
    }

    /// Fail a generation whose initiate call did not succeed.
    pub fn fail_initiation(&self, generation: u64, message: &str) -> bool {
        let active = self.active.lock();
        if active.generation != generation || active.cancelled {
            return false;
        }
        if self.published.borrow().status != SearchStatus::Initiating {
            return false;
        }
        self.published.send_modify(|s| s.fail_search(message));
        true
    }

    /// Whether continuations holding `ticket` may still act.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.active.lock().matches(ticket)
    }

    /// Apply `update` and move to `next`, but only if `ticket` is still the
    /// active search and the state machine allows the move.
    pub fn transition(
        &self,
        ticket: &SearchTicket,
        next: SearchStatus,
        update: impl FnOnce(&mut SearchSession),
    ) -> bool {
        let active = self.active.lock();
        if !active.matches(ticket) {
            tracing::trace!(token = %ticket.token, next = %next, "stale transition dropped");
            return false;
        }
        let current = self.published.borrow().status;
        if !current.can_transition_to(next) {
            tracing::warn!(
                token = %ticket.token,
                from = %current,
                to = %next,
                "illegal session transition rejected"
            );
            return false;
        }
        self.published.send_modify(|s| {
            update(s);
            s.status = next;
        });
        true
    }

    /// Cancel the active search if `token` names it. Terminal sessions and
    /// foreign tokens are left untouched.
    pub fn cancel(&self, token: &SearchToken) -> bool {
        let mut active = self.active.lock();
        if active.cancelled || active.token.as_ref() != Some(token) {
            return false;
        }
        if !self
            .published
            .borrow()
            .status
            .can_transition_to(SearchStatus::Cancelled)
        {
            return false;
        }
        active.cancelled = true;
        self.published.send_modify(|s| s.mark_cancelled());
        true
    }

    /// Current presented session.
    pub fn snapshot(&self) -> SearchSession {
        self.published.borrow().clone()
    }

    /// Receiver that observes every published session.
    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.published.subscribe()
    }
}
