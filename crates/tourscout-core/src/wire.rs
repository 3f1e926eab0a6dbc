//! Gateway wire types: JSON bodies exchanged with the remote search API.
//!
//! Field names follow the remote API (`hotelID`, `waitUntil`, `cityName`).
//! Offer entries are kept as raw `serde_json::Value`s until `parse_offers`
//! validates them, so one malformed entry never poisons the whole payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::{Enrichment, HotelDescriptor, HotelId, TourOffer};

/// HTTP status the gateway uses for "results not ready yet".
pub const NOT_READY_STATUS: u16 = 425;

// ── Search lifecycle ──────────────────────────────────────────────────────────

/// Body of a successful initiate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSearchResponse {
    pub token: String,
    #[serde(default)]
    pub wait_until: Option<String>,
}

/// Body of a not-ready poll response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotReadyResponse {
    #[serde(default)]
    pub wait_until: Option<String>,
}

/// Body of a ready poll response. `prices` is either an object keyed by
/// offer id or a plain array; both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricesPayload {
    #[serde(default)]
    pub prices: Value,
}

/// Result of one poll attempt that reached the server and was understood.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Ready(PricesPayload),
    NotReady { wait_until: Option<String> },
}

// ── Enrichment ────────────────────────────────────────────────────────────────

/// Hotel listing for a country: an object keyed by an opaque server key, or a
/// plain array. Records stay raw until `build_enrichment` validates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotelsPayload(pub Value);

// ── Detail view ───────────────────────────────────────────────────────────────

/// A single offer, as returned by the offer detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDetails {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// A single hotel, as returned by the hotel detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    pub id: HotelId,
    pub name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Amenity name → "yes" / "no" / free text.
    #[serde(default)]
    pub services: HashMap<String, String>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Turn a ready payload into offers, in payload order.
///
/// Dropped: entries without an offer id or hotel id, entries whose amount is
/// not a JSON number, and entries whose hotel id is not a positive integer.
pub fn parse_offers(payload: &PricesPayload) -> Vec<TourOffer> {
    let entries: Box<dyn Iterator<Item = &Value>> = match &payload.prices {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => return Vec::new(),
    };
    entries.filter_map(parse_offer).collect()
}

fn parse_offer(entry: &Value) -> Option<TourOffer> {
    let offer_id = entry.get("id").and_then(non_empty_id)?;
    let hotel_id = entry.get("hotelID").and_then(hotel_id)?;
    let price = entry.get("amount").and_then(Value::as_f64)?;

    Some(TourOffer {
        offer_id,
        hotel_id,
        price,
        currency: string_field(entry, "currency"),
        start_date: string_field(entry, "startDate"),
        end_date: string_field(entry, "endDate"),
    })
}

fn non_empty_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Hotel ids arrive as strings or numbers; both normalize to a positive integer.
/// Integral floats (`7.0`, `"7.0"`) are accepted.
fn hotel_id(v: &Value) -> Option<HotelId> {
    if let Some(id) = v.as_u64() {
        return (id > 0).then_some(id);
    }
    let id = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (id.is_finite() && id >= 1.0 && id.fract() == 0.0 && id <= HotelId::MAX as f64)
        .then_some(id as HotelId)
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Build the hotel-id keyed enrichment map from a hotel listing.
///
/// Records that are not objects or carry no usable id are skipped.
pub fn build_enrichment(hotels: &HotelsPayload) -> Enrichment {
    let records: Box<dyn Iterator<Item = &Value>> = match &hotels.0 {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => return Enrichment::new(),
    };
    records
        .filter_map(parse_hotel)
        .map(|hotel| (hotel.id, hotel))
        .collect()
}

fn parse_hotel(record: &Value) -> Option<HotelDescriptor> {
    if !record.is_object() {
        return None;
    }
    let id = record.get("id").and_then(hotel_id)?;
    Some(HotelDescriptor {
        id,
        name: string_field(record, "name").unwrap_or_default(),
        city: string_field(record, "cityName").unwrap_or_default(),
        country: string_field(record, "countryName").unwrap_or_default(),
        images: string_field(record, "img").into_iter().collect(),
    })
}
