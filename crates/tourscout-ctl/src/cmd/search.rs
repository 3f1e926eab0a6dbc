//! Search command: run one search to completion and print the offers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use tourscout_client::HttpGateway;
use tourscout_core::config::TourscoutConfig;
use tourscout_core::session::{SearchSession, SearchStatus};
use tourscout_services::SearchOrchestrator;

/// Time given to the background stop request before the process exits.
const CANCEL_GRACE: Duration = Duration::from_millis(250);

pub async fn cmd_search(config: &TourscoutConfig, country_id: &str) -> Result<()> {
    let gateway = Arc::new(HttpGateway::new(&config.gateway)?);
    let orchestrator = SearchOrchestrator::new(gateway, config.search.clone());
    let mut updates = orchestrator.subscribe();

    orchestrator.start_search(country_id).await;

    let mut last: Option<(SearchStatus, u32)> = None;
    loop {
        let session = updates.borrow_and_update().clone();
        if last != Some((session.status, session.retry_count)) {
            print_progress(&session);
            last = Some((session.status, session.retry_count));
        }
        if session.status.is_terminal() {
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                changed.context("search orchestrator stopped")?;
            }
            _ = tokio::signal::ctrl_c() => {
                match &session.token {
                    Some(token) if session.status.is_cancellable() => {
                        orchestrator.cancel_search(token);
                        tokio::time::sleep(CANCEL_GRACE).await;
                    }
                    _ => println!("  search cannot be cancelled while {}", session.status),
                }
            }
        }
    }

    print_results(&orchestrator.snapshot());
    Ok(())
}

fn print_progress(session: &SearchSession) {
    match session.status {
        SearchStatus::Loading if session.retry_count > 0 => {
            println!("  … loading (retry {})", session.retry_count)
        }
        status => println!("  … {}", status),
    }
}

fn print_results(session: &SearchSession) {
    let country = session.country_id.as_deref().unwrap_or("?");

    println!("═══════════════════════════════════════");
    println!("  Search Results ({})", country);
    println!("═══════════════════════════════════════");
    println!("  Status : {}", session.status);
    if let Some(error) = &session.error {
        println!("  Error  : {}", error);
    }

    let joined = session.joined_results();
    if joined.is_empty() {
        if session.status == SearchStatus::Success {
            println!("\n  No offers found.");
        }
        return;
    }

    println!("\n  Offers ({}):", joined.len());
    for (offer, hotel) in joined {
        let currency = offer.currency.as_deref().unwrap_or("");
        println!("  ┌─ {:.2} {}", offer.price, currency);
        match hotel {
            Some(h) => {
                println!("  │  hotel : {} (#{})", h.name, h.id);
                println!("  │  where : {}, {}", h.city, h.country);
            }
            None => println!("  │  hotel : #{}", offer.hotel_id),
        }
        if let Some(start) = &offer.start_date {
            println!("  │  from  : {}", start);
        }
        println!("  └─ offer : {}", offer.offer_id);
    }
}
