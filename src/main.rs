//! # Polizei Archiv
//!
//! A crawler for the public Berlin police press-release archive. It walks
//! the archive in four stages (year links → listing pages → report links →
//! report records), throttling every request and persisting each stage's
//! output to a local JSON store so an interrupted or repeated run resumes
//! from disk instead of re-fetching.
//!
//! ## Usage
//!
//! ```sh
//! # Replay cached stage outputs, sample 5 reports per year
//! polizei_archiv -d ./scraped_data
//!
//! # Re-fetch everything and crawl the whole archive
//! polizei_archiv -d ./scraped_data --refresh --live
//! ```
//!
//! ## Architecture
//!
//! 1. **Archive discovery**: extract year-archive links from the index page
//! 2. **Page enumeration**: read each year's pagination, synthesize listing
//!    page URLs
//! 3. **Article discovery**: collect report links from every listing page
//! 4. **Article extraction**: fetch each report not yet in the ledger and
//!    append the extracted record
//!
//! The ledger (`all_reports_all_years_all_pages.json`) doubles as the dedup
//! index: a URL with a recorded 200 response is never fetched again.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod extract;
mod fetch;
mod models;
mod pipeline;
mod store;

use cli::Cli;
use config::CrawlConfig;
use fetch::Fetcher;
use models::Ledger;
use store::JsonStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("polizei_archiv starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = CrawlConfig::from(&args);
    info!(
        refresh = config.refresh,
        live = config.live,
        data_dir = %args.data_dir,
        "Crawl configuration"
    );

    let store = JsonStore::open(&args.data_dir)?;
    let fetcher = Fetcher::new(&config)?;

    let summary = match pipeline::run(&config, &store, &fetcher).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Crawl failed");
            return Err(e);
        }
    };

    let ledger: Ledger = serde_json::from_value(store.read(config::LEDGER)?)?;
    let elapsed = start_time.elapsed();
    info!(
        total_records = ledger.items.len(),
        years = summary.years,
        listing_pages = summary.listing_pages,
        article_links = summary.article_links,
        appended = summary.appended,
        skipped = summary.skipped,
        secs = elapsed.as_secs(),
        "Execution complete"
    );

    Ok(())
}
