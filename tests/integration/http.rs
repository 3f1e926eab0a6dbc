//! HTTP gateway tests against an axum stub of the remote search API.
//!
//! Stub behaviour is keyed off the request:
//!   countryID=fail     → initiate answers 500
//!   countryID=slow     → initiate hints a wait one minute out
//!   countryID=broken   → hotel listing is not JSON
//!   token=tok-garbled  → 425 with a non-JSON body
//!   /prices/missing    → 404

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;

use tourscout_client::HttpGateway;
use tourscout_core::config::{GatewayConfig, SearchConfig};
use tourscout_core::session::{SearchSession, SearchStatus, SearchToken};
use tourscout_core::wire::PollOutcome;
use tourscout_services::{
    load_tour_details, DetailsStatus, GatewayError, SearchGateway, SearchOrchestrator,
};

use crate::wait_until_in;

type Params = Query<HashMap<String, String>>;

// ── Stub server ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct StubState {
    /// Polls answered 425 before results are served.
    not_ready: usize,
    polls: Arc<AtomicUsize>,
    stops: Arc<Mutex<Vec<String>>>,
}

async fn handle_start(Query(params): Params) -> Response {
    let country = params.get("countryID").cloned().unwrap_or_default();
    let wait_until = match country.as_str() {
        "fail" => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "slow" => wait_until_in(60),
        _ => wait_until_in(-1),
    };
    Json(json!({ "token": format!("tok-{country}"), "waitUntil": wait_until })).into_response()
}

async fn handle_prices(State(state): State<StubState>, Query(params): Params) -> Response {
    if params.get("token").map(String::as_str) == Some("tok-garbled") {
        return (StatusCode::from_u16(425).unwrap_or(StatusCode::OK), "not yet").into_response();
    }
    let seen = state.polls.fetch_add(1, Ordering::SeqCst);
    if seen < state.not_ready {
        let status = StatusCode::from_u16(425).unwrap_or(StatusCode::OK);
        return (status, Json(json!({ "waitUntil": wait_until_in(-1) }))).into_response();
    }
    Json(json!({
        "prices": {
            "p-2": { "id": "p-2", "hotelID": "7", "amount": 800, "currency": "usd",
                     "startDate": "2026-11-02", "endDate": "2026-11-09" },
            "p-1": { "id": "p-1", "hotelID": 8, "amount": 650, "currency": "usd",
                     "startDate": "2026-11-01", "endDate": "2026-11-08" },
        }
    }))
    .into_response()
}

async fn handle_stop(State(state): State<StubState>, Query(params): Params) -> StatusCode {
    if let Some(token) = params.get("token") {
        state.stops.lock().push(token.clone());
    }
    StatusCode::OK
}

async fn handle_hotels(Query(params): Params) -> Response {
    if params.get("countryID").map(String::as_str) == Some("broken") {
        return "<html>maintenance</html>".into_response();
    }
    Json(json!({
        "7": { "id": 7, "name": "Sea View", "cityName": "Hurghada", "countryName": "Egypt",
               "img": "https://img.example/7.jpg" },
        "8": { "id": "8", "name": "Dune Palace", "cityName": "Hurghada", "countryName": "Egypt" },
        "closed": { "name": "Former Resort" },
    }))
    .into_response()
}

async fn handle_offer(Path(id): Path<String>) -> Response {
    if id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "id": id, "amount": 650, "currency": "usd",
        "startDate": "2026-11-01", "endDate": "2026-11-08"
    }))
    .into_response()
}

async fn handle_hotel(Path(id): Path<u64>) -> Json<serde_json::Value> {
    Json(json!({
        "id": id, "name": "Dune Palace", "cityName": "Hurghada", "countryName": "Egypt",
        "description": "Beachfront.", "services": { "wifi": "yes", "pool": "no" }
    }))
}

/// Serve the stub on an ephemeral port and return its API base URL.
async fn spawn_stub(state: StubState) -> anyhow::Result<String> {
    let api = Router::new()
        .route("/search/start", post(handle_start))
        .route("/search/prices", get(handle_prices))
        .route("/search/stop", post(handle_stop))
        .route("/hotels", get(handle_hotels))
        .route("/prices/{id}", get(handle_offer))
        .route("/hotels/{id}", get(handle_hotel))
        .with_state(state);
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api"))
}

fn gateway(base_url: &str) -> HttpGateway {
    let config = GatewayConfig {
        base_url: base_url.to_string(),
        request_timeout_ms: 2_000,
    };
    HttpGateway::new(&config).expect("client should build")
}

fn fast_settings() -> SearchConfig {
    SearchConfig {
        retry_delay_ms: 10,
        default_wait_ms: 10,
        ..SearchConfig::default()
    }
}

async fn wait_for_status(
    orchestrator: &SearchOrchestrator,
    done: impl FnMut(&SearchSession) -> bool,
) -> SearchSession {
    let mut rx = orchestrator.subscribe();
    let session = tokio::time::timeout(Duration::from_secs(10), rx.wait_for(done))
        .await
        .expect("search did not settle over HTTP")
        .expect("session channel closed")
        .clone();
    session
}

// ── End to end ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_completes_over_http() {
    let stub = StubState {
        not_ready: 1,
        ..StubState::default()
    };
    let base = spawn_stub(stub.clone()).await.expect("stub server");
    let orch = SearchOrchestrator::new(Arc::new(gateway(&base)), fast_settings());

    orch.start_search("43").await;
    assert_eq!(orch.snapshot().token, Some(SearchToken::new("tok-43")));

    let session = wait_for_status(&orch, |s| s.status.is_terminal()).await;
    assert_eq!(session.status, SearchStatus::Success, "{:?}", session.error);
    assert_eq!(stub.polls.load(Ordering::SeqCst), 2);

    let joined = session.joined_results();
    let summary: Vec<(&str, f64, Option<&str>)> = joined
        .iter()
        .map(|(offer, hotel)| {
            (offer.offer_id.as_str(), offer.price, hotel.map(|h| h.name.as_str()))
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("p-1", 650.0, Some("Dune Palace")),
            ("p-2", 800.0, Some("Sea View")),
        ]
    );
}

#[tokio::test]
async fn cancel_sends_stop_request() {
    let stub = StubState::default();
    let base = spawn_stub(stub.clone()).await.expect("stub server");
    let orch = SearchOrchestrator::new(Arc::new(gateway(&base)), fast_settings());

    orch.start_search("slow").await;
    assert_eq!(orch.snapshot().status, SearchStatus::Waiting);
    assert!(orch.cancel_search(&SearchToken::new("tok-slow")));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while stub.stops.lock().is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(*stub.stops.lock(), vec!["tok-slow".to_string()]);
    assert_eq!(stub.polls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.snapshot().status, SearchStatus::Cancelled);
}

#[tokio::test]
async fn details_load_over_http() {
    let base = spawn_stub(StubState::default()).await.expect("stub server");
    let gw = gateway(&base);

    let details = load_tour_details(&gw, Some("p-1"), Some(8)).await;
    assert_eq!(details.status, DetailsStatus::Success, "{:?}", details.error);
    let offer = details.offer.expect("offer");
    assert_eq!(offer.amount, 650.0);
    assert_eq!(offer.end_date.as_deref(), Some("2026-11-08"));
    let hotel = details.hotel.expect("hotel");
    assert_eq!(hotel.id, 8);
    assert_eq!(hotel.services.get("pool").map(String::as_str), Some("no"));
}

// ── Error mapping ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn not_ready_without_a_readable_body_is_still_not_ready() {
    let base = spawn_stub(StubState::default()).await.expect("stub server");
    let outcome = gateway(&base)
        .poll_search(&SearchToken::new("tok-garbled"))
        .await
        .expect("425 is not an error");
    assert!(matches!(outcome, PollOutcome::NotReady { wait_until: None }));
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let base = spawn_stub(StubState::default()).await.expect("stub server");
    let gw = gateway(&base);

    let start = gw.initiate_search("fail").await;
    assert_eq!(start.err(), Some(GatewayError::Status(500)));

    let offer = gw.fetch_offer("missing").await;
    assert_eq!(offer.err(), Some(GatewayError::Status(404)));
}

#[tokio::test]
async fn unparseable_body_maps_to_decode() {
    let base = spawn_stub(StubState::default()).await.expect("stub server");
    let hotels = gateway(&base).fetch_hotels("broken").await;
    assert!(matches!(hotels, Err(GatewayError::Decode(_))), "{hotels:?}");
}

#[tokio::test]
async fn unreachable_server_maps_to_transport() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let result = gateway(&format!("http://{addr}/api"))
        .initiate_search("43")
        .await;
    assert!(matches!(result, Err(GatewayError::Transport(_))), "{result:?}");
}
