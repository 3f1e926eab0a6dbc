//! Search orchestrator, the public entry point for running tour searches.
//!
//! Flow for one search:
//!   start_search → initiate → Waiting ─timer→ Loading → poll
//!     poll not ready  → Waiting, new timer at the server's `waitUntil`
//!     poll failed     → stay Loading, retry after a fixed delay (bounded)
//!     poll ready      → aggregator → FetchingEnrichment → Success / Error
//!
//! Every continuation carries the `SearchTicket` it was issued for. A newer
//! `start_search` or a `cancel_search` makes older tickets stale, and stale
//! continuations end without touching the presented session.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;

use tourscout_core::config::SearchConfig;
use tourscout_core::pacing;
use tourscout_core::session::{
    HotelId, SearchSession, SearchStatus, SearchToken, START_FAILED_MESSAGE,
};
use tourscout_core::wire::{self, PollOutcome};

use crate::aggregator::ResultAggregator;
use crate::details::{load_tour_details, TourDetails};
use crate::gateway::{GatewayError, SearchGateway};
use crate::scheduler::PollScheduler;
use crate::state::{SearchTicket, SessionStore};

/// Message when the opt-in total duration cap is hit.
pub const TIMED_OUT_MESSAGE: &str = "search timed out";

struct Inner {
    gateway: Arc<dyn SearchGateway>,
    store: SessionStore,
    scheduler: PollScheduler,
    aggregator: ResultAggregator,
    settings: SearchConfig,
    runtime: tokio::runtime::Handle,
}

/// Drives tour searches against a `SearchGateway`. Cheap to clone.
#[derive(Clone)]
pub struct SearchOrchestrator {
    inner: Arc<Inner>,
}

impl SearchOrchestrator {
    /// Create an orchestrator. Must be called from within a Tokio runtime;
    /// timers and fire-and-forget cancels are spawned onto it.
    pub fn new(gateway: Arc<dyn SearchGateway>, settings: SearchConfig) -> Self {
        let store = SessionStore::new();
        Self {
            inner: Arc::new(Inner {
                scheduler: PollScheduler::new(store.clone()),
                aggregator: ResultAggregator::new(gateway.clone(), store.clone()),
                gateway,
                store,
                settings,
                runtime: tokio::runtime::Handle::current(),
            }),
        }
    }

    /// Start a new search, superseding whatever search was running.
    ///
    /// Returns once the gateway has accepted (or refused) the search; polling
    /// continues in the background. Failures surface only on the session.
    pub async fn start_search(&self, country_id: &str) {
        let inner = &self.inner;
        let begun = inner.store.begin(country_id);
        if let Some(previous) = &begun.superseded {
            inner.scheduler.clear(previous);
            self.cancel_remote(previous.clone());
            tracing::info!(token = %previous, "running search superseded");
        }
        tracing::info!(country_id, generation = begun.generation, "search starting");

        let started = match inner.gateway.initiate_search(country_id).await {
            Ok(started) => started,
            Err(e) => {
                tracing::warn!(country_id, error = %e, "search initiation failed");
                inner.store.fail_initiation(begun.generation, START_FAILED_MESSAGE);
                return;
            }
        };

        let delay = self.server_delay(started.wait_until.as_deref());
        if self.exceeds_budget(begun.started_at, delay) {
            inner.store.fail_initiation(begun.generation, TIMED_OUT_MESSAGE);
            self.cancel_remote(started.token);
            return;
        }

        let Some(ticket) = inner
            .store
            .activate(&begun, started.token.clone(), country_id)
        else {
            // A newer search started while this one was being accepted.
            self.cancel_remote(started.token);
            return;
        };

        tracing::info!(token = %ticket.token, country_id, "search accepted");
        self.wait_then_poll(ticket, delay);
    }

    /// Cancel the active search if `token` names it; otherwise do nothing.
    ///
    /// The session reads `Cancelled` by the time this returns. The remote
    /// cancel is sent in the background and its outcome is ignored.
    pub fn cancel_search(&self, token: &SearchToken) -> bool {
        if !self.inner.store.cancel(token) {
            tracing::debug!(token = %token, "cancel ignored, not the active search");
            return false;
        }
        self.inner.scheduler.clear(token);
        self.cancel_remote(token.clone());
        tracing::info!(token = %token, "search cancelled");
        true
    }

    /// Current presented session.
    pub fn snapshot(&self) -> SearchSession {
        self.inner.store.snapshot()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.inner.store.subscribe()
    }

    /// Load one tour's offer and hotel details through the same gateway.
    pub async fn load_tour_details(
        &self,
        offer_id: Option<&str>,
        hotel_id: Option<HotelId>,
    ) -> TourDetails {
        load_tour_details(self.inner.gateway.as_ref(), offer_id, hotel_id).await
    }

    // ── Poll cycle ───────────────────────────────────────────────────────────

    fn server_delay(&self, wait_until: Option<&str>) -> Duration {
        pacing::delay_until(
            wait_until,
            chrono::Utc::now(),
            self.inner.settings.default_wait(),
        )
    }

    /// Whether a server-paced wait of `delay` would overrun the opt-in cap.
    fn exceeds_budget(&self, started_at: tokio::time::Instant, delay: Duration) -> bool {
        let Some(cap) = self.inner.settings.max_search() else {
            return false;
        };
        let exceeded = started_at.elapsed() + delay > cap;
        if exceeded {
            tracing::warn!(
                cap_ms = cap.as_millis() as u64,
                delay_ms = delay.as_millis() as u64,
                "search would exceed its time budget"
            );
        }
        exceeded
    }

    /// Arm the server-paced timer. The session is already `Waiting`.
    fn wait_then_poll(&self, ticket: SearchTicket, delay: Duration) {
        let attempt = self.poll_attempt(ticket.clone(), 0);
        self.inner.scheduler.schedule(ticket, delay, attempt);
    }

    fn poll_attempt(&self, ticket: SearchTicket, retry: u32) -> BoxFuture<'static, ()> {
        let this = self.clone();
        async move { this.poll(ticket, retry).await }.boxed()
    }

    async fn poll(&self, ticket: SearchTicket, retry: u32) {
        let inner = &self.inner;
        if !inner
            .store
            .transition(&ticket, SearchStatus::Loading, |s| s.mark_loading(retry))
        {
            return;
        }
        tracing::debug!(token = %ticket.token, retry, "polling for results");

        let outcome = inner.gateway.poll_search(&ticket.token).await;
        if !inner.store.is_current(&ticket) {
            tracing::debug!(token = %ticket.token, "poll response for inactive search dropped");
            return;
        }

        match outcome {
            Ok(PollOutcome::Ready(payload)) => {
                let offers = wire::parse_offers(&payload);
                tracing::debug!(token = %ticket.token, offers = offers.len(), "results ready");
                inner.aggregator.aggregate(&ticket, offers).await;
            }
            Ok(PollOutcome::NotReady { wait_until }) => {
                let delay = self.server_delay(wait_until.as_deref());
                if self.exceeds_budget(ticket.started_at, delay) {
                    inner.store.transition(&ticket, SearchStatus::Error, |s| {
                        s.fail_search(TIMED_OUT_MESSAGE)
                    });
                    self.cancel_remote(ticket.token);
                    return;
                }
                if inner
                    .store
                    .transition(&ticket, SearchStatus::Waiting, |s| s.retry_count = 0)
                {
                    self.wait_then_poll(ticket, delay);
                }
            }
            Err(e) => self.handle_poll_failure(ticket, retry, e),
        }
    }

    fn handle_poll_failure(&self, ticket: SearchTicket, retry: u32, error: GatewayError) {
        let settings = &self.inner.settings;
        if retry < settings.max_retries {
            tracing::warn!(
                token = %ticket.token,
                attempt = retry + 1,
                error = %error,
                "poll failed, retrying"
            );
            let attempt = self.poll_attempt(ticket.clone(), retry + 1);
            self.inner
                .scheduler
                .schedule(ticket, settings.retry_delay(), attempt);
            return;
        }

        tracing::warn!(
            token = %ticket.token,
            attempts = retry + 1,
            error = %error,
            "poll failed, retry limit reached"
        );
        let message = format!("search failed ({error}); retry limit reached");
        self.inner
            .store
            .transition(&ticket, SearchStatus::Error, |s| s.fail_search(message));
    }

    fn cancel_remote(&self, token: SearchToken) {
        let gateway = self.inner.gateway.clone();
        self.inner.runtime.spawn(async move {
            if let Err(e) = gateway.cancel_search(&token).await {
                tracing::debug!(token = %token, error = %e, "remote cancel failed");
            }
        });
    }
}
