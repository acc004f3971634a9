//! Command-line interface definitions for the archive crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The run-mode switches that used to be edit-the-source constants
//! (refresh, live) are ordinary flags here.

use clap::Parser;

/// Command-line arguments for the archive crawler.
///
/// # Examples
///
/// ```sh
/// # Replay cached stage outputs, sample 5 articles per year
/// polizei_archiv -d ./scraped_data
///
/// # Re-fetch everything and crawl all discovered articles
/// polizei_archiv -d ./scraped_data --refresh --live
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the cache artifacts and the report ledger
    #[arg(short, long, default_value = "./scraped_data")]
    pub data_dir: String,

    /// Re-fetch stage outputs instead of replaying the cached artifacts
    #[arg(long)]
    pub refresh: bool,

    /// Crawl every discovered article (default: sample 5 per year)
    #[arg(long)]
    pub live: bool,

    /// Archive index page to start from
    #[arg(
        long,
        default_value = "https://www.berlin.de/polizei/polizeimeldungen/archiv/"
    )]
    pub archive_url: String,

    /// Base URL that relative listing and article paths resolve against
    #[arg(long, default_value = "https://www.berlin.de")]
    pub base_url: String,

    /// User-Agent header identifying this crawler to the site operator
    #[arg(
        long,
        env = "CRAWLER_USER_AGENT",
        default_value = "htw-studi-agent (http://htw.info-miner.de)"
    )]
    pub user_agent: String,

    /// From header with a contact address for the site operator
    #[arg(
        long,
        env = "CRAWLER_CONTACT",
        default_value = "thomas.hoppe@htw-berlin.de"
    )]
    pub contact: String,
}
