//! Data models for scraped police reports and the on-disk ledger.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`ArticleRecord`]: One extracted police report with its fetch status
//! - [`Ledger`]: The `{"items": [...]}` document holding all records,
//!   doubling as the deduplication index
//! - [`CrawlSummary`]: Per-run counters reported at shutdown
//!
//! The field names match the historical JSON schema of the scraped-data
//! directory, so existing ledgers remain readable.

use serde::{Deserialize, Serialize};

/// HTTP status treated as "already successfully fetched" by the dedup scan.
pub const SUCCESS_STATUS: u16 = 200;

/// One police report as extracted from an article page.
///
/// A record is appended to the ledger for every non-skipped fetch, including
/// non-200 responses: those carry whatever fields could be extracted from the
/// error body and stay eligible for a retry on a later run, because only
/// `response == 200` counts as already-fetched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// HTTP status code received when fetching the article.
    pub response: u16,
    /// The report headline.
    pub headline: String,
    /// Raw publication timestamp text, e.g. "Polizeimeldung vom 24.12.2019".
    pub published: String,
    /// District name, either stated on the page or inferred from the first
    /// sub-heading. Empty when neither source yields one.
    pub bezirk: String,
    /// Bold lead-in fragments from the report body. A single `" "` entry
    /// marks a report without sub-headings.
    pub subheads: Vec<String>,
    /// Body text with internal whitespace collapsed to single spaces.
    pub article: String,
    /// Absolute URL the report was fetched from. Dedup key.
    pub url: String,
}

/// The on-disk ledger document: an ordered, append-only list of records.
///
/// Read in full before any mutation; never written partially. The same
/// `{"items": []}` shape is used to initialize every store-managed file,
/// so file existence implies a well-formed document.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Ledger {
    /// All records in append order.
    pub items: Vec<ArticleRecord>,
}

/// Counters accumulated over one crawl, logged at the end of the run.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    /// Archive years discovered (stage 1).
    pub years: usize,
    /// Listing pages enumerated across all years (stage 2).
    pub listing_pages: usize,
    /// Article links discovered across all years (stage 3).
    pub article_links: usize,
    /// Records newly appended to the ledger (stage 4).
    pub appended: usize,
    /// Links skipped because the ledger already held a 200 record.
    pub skipped: usize,
}
