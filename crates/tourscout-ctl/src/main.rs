//! tourscout-ctl — run tour searches against the remote search API.

use anyhow::{Context, Result};

use tourscout_core::config::TourscoutConfig;

mod cmd;

fn print_usage() {
    println!("Usage: tourscout-ctl [--base-url <url>] <command>");
    println!();
    println!("Commands:");
    println!("  search <countryId>             Run a search and print offers (Ctrl-C cancels)");
    println!("  details <offerId> <hotelId>    Show one offer and its hotel");
    println!("  config                         Show the effective configuration");
    println!();
    println!("Options:");
    println!("  --base-url <url>   Search API base URL (overrides config)");
    println!();
    println!("Logging is controlled by RUST_LOG, e.g. RUST_LOG=tourscout_services=debug");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut base_url: Option<String> = None;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--base-url" {
            i += 1;
            base_url = Some(args.get(i).context("--base-url requires a value")?.clone());
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    let mut config = TourscoutConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        TourscoutConfig::default()
    });
    if let Some(url) = base_url {
        config.gateway.base_url = url;
    }

    match remaining.as_slice() {
        ["search", country_id] => cmd::search::cmd_search(&config, country_id).await,
        ["details", offer_id, hotel_id] => {
            cmd::details::cmd_details(&config, offer_id, hotel_id).await
        }
        ["config"] => cmd::config::cmd_config(&config),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
