//! Tour detail command.

use anyhow::{bail, Context, Result};

use tourscout_client::HttpGateway;
use tourscout_core::config::TourscoutConfig;
use tourscout_core::session::HotelId;
use tourscout_services::{load_tour_details, DetailsStatus};

pub async fn cmd_details(config: &TourscoutConfig, offer_id: &str, hotel_id: &str) -> Result<()> {
    let hotel_id: HotelId = hotel_id.parse().context("hotelId must be a positive number")?;
    let gateway = HttpGateway::new(&config.gateway)?;

    let details = load_tour_details(&gateway, Some(offer_id), Some(hotel_id)).await;
    let (DetailsStatus::Success, Some(offer), Some(hotel)) =
        (details.status, details.offer, details.hotel)
    else {
        bail!(details.error.unwrap_or_else(|| "tour details unavailable".to_string()));
    };

    println!("═══════════════════════════════════════");
    println!("  {}", hotel.name);
    println!("═══════════════════════════════════════");
    println!("  Location : {}, {}", hotel.city_name, hotel.country_name);
    println!("  Offer    : {}", offer.id);
    println!("  Price    : {:.2} {}", offer.amount, offer.currency);
    match &offer.end_date {
        Some(end) => println!("  Dates    : {} → {}", offer.start_date, end),
        None => println!("  Dates    : from {}", offer.start_date),
    }
    if let Some(img) = &hotel.img {
        println!("  Image    : {}", img);
    }
    if !hotel.description.is_empty() {
        println!();
        println!("  {}", hotel.description);
    }
    if !hotel.services.is_empty() {
        let mut services: Vec<_> = hotel.services.iter().collect();
        services.sort();
        println!();
        println!("  Services:");
        for (name, value) in services {
            println!("  │  {:<16} : {}", name, value);
        }
    }

    Ok(())
}
