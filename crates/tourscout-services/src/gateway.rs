//! Gateway trait for the remote search API.
//!
//! The orchestrator never speaks HTTP itself. This trait is the contract
//! between the orchestrator (which decides when to call) and a transport
//! (which knows how). `tourscout-client` provides the HTTP implementation.

use async_trait::async_trait;

use tourscout_core::session::{HotelId, SearchToken};
use tourscout_core::wire::{HotelDetails, HotelsPayload, OfferDetails, PollOutcome};

/// A search the gateway has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSearch {
    pub token: SearchToken,
    /// Server pacing hint (RFC 3339) for the first poll.
    pub wait_until: Option<String>,
}

/// Why a gateway call failed. "Not ready" is not an error; see `PollOutcome`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("network failure: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Remote search API.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Start a search for a country. Returns the session token and first pacing hint.
    async fn initiate_search(&self, country_id: &str) -> Result<StartedSearch, GatewayError>;

    /// Ask for results. Distinguishes ready, not-ready, and failure.
    async fn poll_search(&self, token: &SearchToken) -> Result<PollOutcome, GatewayError>;

    /// Tell the server to stop working on a search. Callers do not wait on it.
    async fn cancel_search(&self, token: &SearchToken) -> Result<(), GatewayError>;

    /// Hotel listing used to enrich the offers of a country search.
    async fn fetch_hotels(&self, country_id: &str) -> Result<HotelsPayload, GatewayError>;

    /// Offer detail, used by the detail view.
    async fn fetch_offer(&self, offer_id: &str) -> Result<OfferDetails, GatewayError>;

    /// Hotel detail, used by the detail view.
    async fn fetch_hotel(&self, hotel_id: HotelId) -> Result<HotelDetails, GatewayError>;
}
