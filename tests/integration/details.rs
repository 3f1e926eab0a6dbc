//! Tour detail loader tests.

use std::collections::HashMap;

use tourscout_core::wire::{HotelDetails, OfferDetails};
use tourscout_services::details::MISSING_IDS_MESSAGE;
use tourscout_services::DetailsStatus;

use crate::*;

fn offer() -> OfferDetails {
    OfferDetails {
        id: "o-77".to_string(),
        amount: 1234.5,
        currency: "usd".to_string(),
        start_date: "2026-12-01".to_string(),
        end_date: Some("2026-12-10".to_string()),
    }
}

fn hotel() -> HotelDetails {
    HotelDetails {
        id: 42,
        name: "Coral Bay".to_string(),
        city_name: "Sharm".to_string(),
        country_name: "Egypt".to_string(),
        img: None,
        description: "On the reef.".to_string(),
        services: HashMap::from([("wifi".to_string(), "yes".to_string())]),
    }
}

#[tokio::test]
async fn loads_offer_and_hotel_together() {
    let gw = ScriptedGateway::new();
    gw.offer(offer()).hotel(hotel());
    let orch = orchestrator(&gw, settings());

    let details = orch.load_tour_details(Some("o-77"), Some(42)).await;

    assert_eq!(details.status, DetailsStatus::Success);
    assert_eq!(details.offer, Some(offer()));
    assert_eq!(details.hotel, Some(hotel()));
    assert!(details.error.is_none());
}

#[tokio::test]
async fn missing_ids_fail_without_calling_the_gateway() {
    let gw = ScriptedGateway::new();
    gw.offer(offer()).hotel(hotel());
    let orch = orchestrator(&gw, settings());

    let cases = [
        (None, Some(42)),
        (Some("o-77"), None),
        (Some(""), Some(42)),
        (Some("o-77"), Some(0)),
    ];
    for (offer_id, hotel_id) in cases {
        let details = orch.load_tour_details(offer_id, hotel_id).await;
        assert_eq!(details.status, DetailsStatus::Error);
        assert_eq!(details.error.as_deref(), Some(MISSING_IDS_MESSAGE));
        assert!(details.offer.is_none() && details.hotel.is_none());
    }
}

#[tokio::test]
async fn one_failed_fetch_fails_the_view() {
    let gw = ScriptedGateway::new();
    gw.offer(offer());
    let orch = orchestrator(&gw, settings());

    let details = orch.load_tour_details(Some("o-77"), Some(42)).await;

    assert_eq!(details.status, DetailsStatus::Error);
    assert!(details.offer.is_none(), "partial detail data is not shown");
    let message = details.error.expect("error message");
    assert!(message.contains("404"), "{message}");
}
