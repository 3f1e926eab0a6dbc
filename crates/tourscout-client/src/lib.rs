//! tourscout-client — HTTP implementation of `SearchGateway`.
//!
//! Endpoints, relative to the configured base URL:
//!   POST /search/start?countryID=…   → { token, waitUntil }
//!   GET  /search/prices?token=…      → 200 { prices } | 425 { waitUntil }
//!   POST /search/stop?token=…
//!   GET  /hotels?countryID=…         → { "<key>": hotel, … }
//!   GET  /prices/{offer_id}
//!   GET  /hotels/{hotel_id}

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use tourscout_core::config::GatewayConfig;
use tourscout_core::session::{HotelId, SearchToken};
use tourscout_core::wire::{
    HotelDetails, HotelsPayload, NotReadyResponse, OfferDetails, PollOutcome, PricesPayload,
    StartSearchResponse, NOT_READY_STATUS,
};
use tourscout_services::{GatewayError, SearchGateway, StartedSearch};

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SearchGateway for HttpGateway {
    async fn initiate_search(&self, country_id: &str) -> Result<StartedSearch, GatewayError> {
        let resp = self
            .client
            .post(self.url("/search/start"))
            .query(&[("countryID", country_id)])
            .send()
            .await
            .map_err(transport)?;
        let body: StartSearchResponse = json_ok(resp).await?;
        Ok(StartedSearch {
            token: SearchToken::new(body.token),
            wait_until: body.wait_until,
        })
    }

    async fn poll_search(&self, token: &SearchToken) -> Result<PollOutcome, GatewayError> {
        let resp = self
            .client
            .get(self.url("/search/prices"))
            .query(&[("token", token.as_str())])
            .send()
            .await
            .map_err(transport)?;

        if resp.status().as_u16() == NOT_READY_STATUS {
            // A not-ready body without a usable hint still means "not ready".
            let wait_until = match resp.json::<NotReadyResponse>().await {
                Ok(body) => body.wait_until,
                Err(e) => {
                    tracing::debug!(token = %token, error = %e, "unreadable not-ready body");
                    None
                }
            };
            return Ok(PollOutcome::NotReady { wait_until });
        }
        let body: PricesPayload = json_ok(resp).await?;
        Ok(PollOutcome::Ready(body))
    }

    async fn cancel_search(&self, token: &SearchToken) -> Result<(), GatewayError> {
        let resp = self
            .client
            .post(self.url("/search/stop"))
            .query(&[("token", token.as_str())])
            .send()
            .await
            .map_err(transport)?;
        check_status(resp.status())
    }

    async fn fetch_hotels(&self, country_id: &str) -> Result<HotelsPayload, GatewayError> {
        let resp = self
            .client
            .get(self.url("/hotels"))
            .query(&[("countryID", country_id)])
            .send()
            .await
            .map_err(transport)?;
        json_ok(resp).await
    }

    async fn fetch_offer(&self, offer_id: &str) -> Result<OfferDetails, GatewayError> {
        let resp = self
            .client
            .get(self.url(&format!("/prices/{offer_id}")))
            .send()
            .await
            .map_err(transport)?;
        json_ok(resp).await
    }

    async fn fetch_hotel(&self, hotel_id: HotelId) -> Result<HotelDetails, GatewayError> {
        let resp = self
            .client
            .get(self.url(&format!("/hotels/{hotel_id}")))
            .send()
            .await
            .map_err(transport)?;
        json_ok(resp).await
    }
}

// ── Response helpers ──────────────────────────────────────────────────────────

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

fn check_status(status: StatusCode) -> Result<(), GatewayError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(GatewayError::Status(status.as_u16()))
    }
}

/// Decode a 2xx JSON body; any other status is a `Status` error.
async fn json_ok<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    let url = resp.url().clone();
    if let Err(e) = check_status(resp.status()) {
        tracing::debug!(url = %url, error = %e, "remote call rejected");
        return Err(e);
    }
    let bytes = resp.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!(url = %url, bytes = bytes.len(), error = %e, "response body did not decode");
        GatewayError::Decode(e.to_string())
    })
}
