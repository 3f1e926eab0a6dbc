//! Tour detail loader: one offer and its hotel, fetched side by side.

use tourscout_core::session::HotelId;
use tourscout_core::wire::{HotelDetails, OfferDetails};

use crate::gateway::SearchGateway;

pub const MISSING_IDS_MESSAGE: &str = "missing offer or hotel id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsStatus {
    Success,
    Error,
}

/// State of a detail view. Both records are present only on success.
#[derive(Debug, Clone, PartialEq)]
pub struct TourDetails {
    pub status: DetailsStatus,
    pub offer: Option<OfferDetails>,
    pub hotel: Option<HotelDetails>,
    pub error: Option<String>,
}

impl TourDetails {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: DetailsStatus::Error,
            offer: None,
            hotel: None,
            error: Some(message.into()),
        }
    }
}

/// Fetch an offer and its hotel concurrently. Either failing fails the whole view.
pub async fn load_tour_details(
    gateway: &dyn SearchGateway,
    offer_id: Option<&str>,
    hotel_id: Option<HotelId>,
) -> TourDetails {
    let ids = (
        offer_id.filter(|id| !id.is_empty()),
        hotel_id.filter(|id| *id > 0),
    );
    let (Some(offer_id), Some(hotel_id)) = ids else {
        return TourDetails::failed(MISSING_IDS_MESSAGE);
    };

    let (offer, hotel) = tokio::join!(gateway.fetch_offer(offer_id), gateway.fetch_hotel(hotel_id));

    match (offer, hotel) {
        (Ok(offer), Ok(hotel)) => TourDetails {
            status: DetailsStatus::Success,
            offer: Some(offer),
            hotel: Some(hotel),
            error: None,
        },
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(offer_id, hotel_id, error = %e, "tour details failed to load");
            TourDetails::failed(format!("failed to load tour details: {e}"))
        }
    }
}
