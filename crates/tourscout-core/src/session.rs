//! Search session model. One record per logical search, as presented to callers.
//!
//! A session is created in `Initiating`, mutated in place as gateway responses
//! arrive, and ends in one of the terminal states (`Success`, `Error`,
//! `Cancelled`). Starting another search replaces the session wholesale; it is
//! never a transition out of a terminal state.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized numeric hotel identifier. Offers and enrichment records join on it.
pub type HotelId = u64;

/// Hotel descriptors keyed by hotel id.
pub type Enrichment = HashMap<HotelId, HotelDescriptor>;

/// Message for a failed initiate call.
pub const START_FAILED_MESSAGE: &str = "could not start search";

/// Message for the partial-success case: offers arrived, hotel details did not.
pub const ENRICHMENT_FAILED_MESSAGE: &str = "search succeeded but hotel details failed to load";

/// Opaque gateway-issued search token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchToken(String);

impl SearchToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a search session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Initiating,
    /// A server-paced poll timer is pending.
    Waiting,
    /// A poll request (or one of its retries) is in flight.
    Loading,
    FetchingEnrichment,
    Success,
    Error,
    Cancelled,
}

impl SearchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Cancelled)
    }

    /// States in which a caller may usefully offer "cancel".
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Waiting | Self::Loading | Self::FetchingEnrichment)
    }

    /// Whether the state machine permits `self → next`.
    pub fn can_transition_to(self, next: SearchStatus) -> bool {
        use SearchStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Cancelled) => self != Idle,
            (Idle, Initiating) => true,
            (Initiating, Waiting | Error) => true,
            (Waiting, Loading) => true,
            (Loading, Waiting | FetchingEnrichment | Loading | Error) => true,
            (FetchingEnrichment, Success | Error) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initiating => "initiating",
            Self::Waiting => "waiting",
            Self::Loading => "loading",
            Self::FetchingEnrichment => "fetching_enrichment",
            Self::Success => "success",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced tour offer from a ready poll response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourOffer {
    pub offer_id: String,
    pub hotel_id: HotelId,
    pub price: f64,
    pub currency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Descriptive hotel data joined onto offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelDescriptor {
    pub id: HotelId,
    pub name: String,
    pub city: String,
    pub country: String,
    pub images: Vec<String>,
}

/// Snapshot of one logical search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSession {
    pub token: Option<SearchToken>,
    pub country_id: Option<String>,
    pub status: SearchStatus,
    pub results: Option<Vec<TourOffer>>,
    pub enrichment: Option<Enrichment>,
    pub error: Option<String>,
    /// Transient failures in the current poll cycle.
    pub retry_count: u32,
}

impl SearchSession {
    /// Fresh session for a search that has not yet been acknowledged.
    pub fn initiating(country_id: impl Into<String>) -> Self {
        Self {
            country_id: Some(country_id.into()),
            status: SearchStatus::Initiating,
            ..Self::default()
        }
    }

    /// Offers paired with their hotel descriptor, in result order.
    pub fn joined_results(&self) -> Vec<(&TourOffer, Option<&HotelDescriptor>)> {
        let Some(results) = &self.results else {
            return Vec::new();
        };
        results
            .iter()
            .map(|offer| {
                let hotel = self
                    .enrichment
                    .as_ref()
                    .and_then(|map| map.get(&offer.hotel_id));
                (offer, hotel)
            })
            .collect()
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = SearchStatus::Error;
        self.error = Some(message.into());
    }
}

// ── Transitions ───────────────────────────────────────────────────────────────
//
// These only shape the record; whether a transition is allowed, and whether
// the caller is still the active session, is decided by the session store.

impl SearchSession {
    pub fn mark_waiting(&mut self, token: &SearchToken) {
        self.token = Some(token.clone());
        self.status = SearchStatus::Waiting;
        self.retry_count = 0;
    }

    pub fn mark_loading(&mut self, retry_count: u32) {
        self.status = SearchStatus::Loading;
        self.retry_count = retry_count;
    }

    pub fn mark_fetching_enrichment(&mut self) {
        self.status = SearchStatus::FetchingEnrichment;
    }

    pub fn succeed(&mut self, results: Vec<TourOffer>, enrichment: Enrichment) {
        self.status = SearchStatus::Success;
        self.results = Some(results);
        self.enrichment = Some(enrichment);
        self.error = None;
    }

    /// Offers survive; the enrichment map is empty.
    pub fn fail_enrichment(&mut self, results: Vec<TourOffer>) {
        self.results = Some(results);
        self.enrichment = Some(Enrichment::new());
        self.fail(ENRICHMENT_FAILED_MESSAGE);
    }

    /// Terminal failure with no usable results.
    pub fn fail_search(&mut self, message: impl Into<String>) {
        self.results = None;
        self.enrichment = None;
        self.fail(message);
    }

    pub fn mark_cancelled(&mut self) {
        self.status = SearchStatus::Cancelled;
    }
}
