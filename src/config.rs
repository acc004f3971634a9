//! Crawl configuration and on-disk artifact names.
//!
//! All run-mode switches are explicit values built from the CLI and handed
//! to the orchestrator; nothing is read from process-wide state.

use crate::cli::Cli;

/// Cached stage-1 output: year-archive paths, one JSON list.
pub const ARCHIVES_BY_YEAR: &str = "archives_by_year";

/// Cached stage-2 output: per-year listing-page paths, list of lists.
/// The misspelling is part of the historical on-disk contract.
pub const PAGE_LINKS_ALL_YEARS: &str = "links_per_achive_pages_all_years";

/// Cached stage-3 output: per-year article paths, list of lists.
pub const REPORT_LINKS_ALL_YEARS: &str = "links_to_reports_all_years";

/// The live ledger of extracted records, `{"items": [...]}`.
pub const LEDGER: &str = "all_reports_all_years_all_pages";

/// In sampling mode (`live == false`) only this many links per year are
/// processed.
pub const SAMPLE_LINKS_PER_YEAR: usize = 5;

/// Explicit configuration for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Absolute URL of the archive index page (stage-1 entry point).
    pub archive_url: String,
    /// Site base URL that relative article/listing paths resolve against.
    pub base_url: String,
    /// When false, every stage replays its cache artifact instead of
    /// fetching.
    pub refresh: bool,
    /// When false, article extraction samples the first
    /// [`SAMPLE_LINKS_PER_YEAR`] links of each year.
    pub live: bool,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// `From` header sent with every request.
    pub contact: String,
}

impl From<&Cli> for CrawlConfig {
    fn from(args: &Cli) -> Self {
        Self {
            archive_url: args.archive_url.clone(),
            base_url: args.base_url.clone(),
            refresh: args.refresh,
            live: args.live,
            user_agent: args.user_agent.clone(),
            contact: args.contact.clone(),
        }
    }
}
