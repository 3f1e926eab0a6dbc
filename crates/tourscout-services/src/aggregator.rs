//! Result aggregator. Joins hotel descriptors onto the offers of a ready poll.

use std::sync::Arc;

use tourscout_core::session::{SearchStatus, TourOffer};
use tourscout_core::wire;

use crate::gateway::SearchGateway;
use crate::state::{SearchTicket, SessionStore};

pub struct ResultAggregator {
    gateway: Arc<dyn SearchGateway>,
    store: SessionStore,
}

impl ResultAggregator {
    pub fn new(gateway: Arc<dyn SearchGateway>, store: SessionStore) -> Self {
        Self { gateway, store }
    }

    /// Fetch enrichment for the ticket's country and publish the final state.
    ///
    /// Offers survive an enrichment failure: the session ends in `Error` with
    /// the offers kept and an empty enrichment map.
    pub async fn aggregate(&self, ticket: &SearchTicket, mut offers: Vec<TourOffer>) {
        if !self.store.transition(ticket, SearchStatus::FetchingEnrichment, |s| {
            s.mark_fetching_enrichment()
        }) {
            return;
        }

        let fetched = self.gateway.fetch_hotels(&ticket.country_id).await;

        match fetched {
            Ok(hotels) => {
                let enrichment = wire::build_enrichment(&hotels);
                sort_by_price(&mut offers);
                let (offer_count, hotel_count) = (offers.len(), enrichment.len());
                if self.store.transition(ticket, SearchStatus::Success, |s| {
                    s.succeed(offers, enrichment)
                }) {
                    tracing::info!(
                        token = %ticket.token,
                        offers = offer_count,
                        hotels = hotel_count,
                        "search complete"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    token = %ticket.token,
                    country_id = %ticket.country_id,
                    error = %e,
                    "hotel enrichment failed, keeping offers"
                );
                self.store
                    .transition(ticket, SearchStatus::Error, |s| s.fail_enrichment(offers));
            }
        }
    }
}

/// Ascending by price. Stable, so equal prices keep discovery order.
pub fn sort_by_price(offers: &mut [TourOffer]) {
    offers.sort_by(|a, b| a.price.total_cmp(&b.price));
}
