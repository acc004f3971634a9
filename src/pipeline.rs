//! The four-stage crawl pipeline and its orchestrator.
//!
//! Stages run strictly in sequence, each persisting its output as a JSON
//! cache artifact so a rerun with refresh disabled replays from disk instead
//! of re-fetching:
//!
//! 1. **Archive discovery**: archive index page → year-archive paths
//! 2. **Page enumeration**: year page pagination → per-year listing paths
//! 3. **Article discovery**: listing pages → per-year report paths
//! 4. **Article extraction**: report pages → [`ArticleRecord`]s appended to
//!    the live ledger, deduplicated against it
//!
//! A transport failure on a single listing page or article is logged and
//! skipped; store faults are fatal because they threaten crawl-state
//! integrity. Every processed, non-skipped record is appended to the ledger
//! exactly once.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::config::{
    CrawlConfig, ARCHIVES_BY_YEAR, LEDGER, PAGE_LINKS_ALL_YEARS, REPORT_LINKS_ALL_YEARS,
    SAMPLE_LINKS_PER_YEAR,
};
use crate::extract;
use crate::fetch::Fetcher;
use crate::models::{ArticleRecord, CrawlSummary};
use crate::store::JsonStore;

/// Run all four stages and return the per-run counters.
#[instrument(level = "info", skip_all, fields(refresh = config.refresh, live = config.live))]
pub async fn run(
    config: &CrawlConfig,
    store: &JsonStore,
    fetcher: &Fetcher,
) -> Result<CrawlSummary, Box<dyn Error>> {
    info!("-------------- Start of crawling --------------");

    let years = discover_archives(config, store, fetcher).await?;
    let pages = enumerate_pages(config, store, fetcher, &years).await?;
    let links = discover_articles(config, store, fetcher, &pages).await?;
    let (appended, skipped) = extract_articles(config, store, fetcher, &links).await?;

    let summary = CrawlSummary {
        years: years.len(),
        listing_pages: pages.iter().map(Vec::len).sum(),
        article_links: links.iter().map(Vec::len).sum(),
        appended: appended.len(),
        skipped,
    };
    info!("-------------- End of crawling --------------");
    Ok(summary)
}

/// Stage 1: extract year-archive paths from the archive index page, or
/// replay the cached list when refresh is off.
#[instrument(level = "info", skip_all)]
pub async fn discover_archives(
    config: &CrawlConfig,
    store: &JsonStore,
    fetcher: &Fetcher,
) -> Result<Vec<String>, Box<dyn Error>> {
    let years = if config.refresh {
        let page = fetcher.get_page(&config.archive_url).await?;
        let years = extract::parse_year_links(&page.body);
        store.write(ARCHIVES_BY_YEAR, &serde_json::to_value(&years)?)?;
        years
    } else {
        load_cached_list(store, ARCHIVES_BY_YEAR)?
    };

    info!(count = years.len(), "Loaded archive year links");
    Ok(years)
}

/// Stage 2: read each year's last page number and synthesize its full list
/// of listing-page paths, or replay the cache.
#[instrument(level = "info", skip_all)]
pub async fn enumerate_pages(
    config: &CrawlConfig,
    store: &JsonStore,
    fetcher: &Fetcher,
    years: &[String],
) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    if !config.refresh {
        return load_cached_list(store, PAGE_LINKS_ALL_YEARS).map(|pages| {
            info!(years = pages.len(), "Replayed listing-page catalogue from cache");
            pages
        });
    }

    let mut all_years = Vec::with_capacity(years.len());
    for year in years {
        let url = match absolute_url(&config.base_url, year) {
            Ok(url) => url,
            Err(e) => {
                error!(year = %year, error = %e, "Unresolvable year path; skipping year");
                all_years.push(Vec::new());
                continue;
            }
        };
        match fetcher.get_page(url.as_str()).await {
            Ok(page) => {
                // A year page without a pagination control has exactly one
                // listing page.
                let last_page = extract::parse_last_page(&page.body).unwrap_or(1);
                let pages = synthesize_page_links(year, last_page);
                info!(year = %year, last_page, "Generated listing-page catalogue for year");
                all_years.push(pages);
            }
            Err(e) => {
                error!(year = %year, error = %e, "Year page fetch failed; skipping year");
                all_years.push(Vec::new());
            }
        }
    }

    store.write(PAGE_LINKS_ALL_YEARS, &serde_json::to_value(&all_years)?)?;
    Ok(all_years)
}

/// Stage 3: collect report links from every listing page, re-caching the
/// accumulated result after each completed year, or replay the cache.
#[instrument(level = "info", skip_all)]
pub async fn discover_articles(
    config: &CrawlConfig,
    store: &JsonStore,
    fetcher: &Fetcher,
    pages_by_year: &[Vec<String>],
) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    if !config.refresh {
        return load_cached_list(store, REPORT_LINKS_ALL_YEARS).map(|links| {
            info!(years = links.len(), "Replayed report links from cache");
            links
        });
    }

    let mut all_years = Vec::with_capacity(pages_by_year.len());
    for pages in pages_by_year {
        let mut year_links = Vec::new();
        for page_path in pages {
            let url = match absolute_url(&config.base_url, page_path) {
                Ok(url) => url,
                Err(e) => {
                    error!(page = %page_path, error = %e, "Unresolvable page path; skipping page");
                    continue;
                }
            };
            match fetcher.get_page(url.as_str()).await {
                Ok(page) => year_links.extend(extract::parse_article_links(&page.body)),
                Err(e) => {
                    error!(page = %page_path, error = %e, "Listing page fetch failed; skipping page")
                }
            }
        }
        info!(
            pages = pages.len(),
            links = year_links.len(),
            "Collected report links for one year"
        );
        all_years.push(year_links);
        // Partial progress survives an interrupted run.
        store.write(REPORT_LINKS_ALL_YEARS, &serde_json::to_value(&all_years)?)?;
    }

    Ok(all_years)
}

/// Stage 4: fetch and extract every report not yet in the ledger with a 200
/// record, appending each new record immediately. Returns the newly
/// appended records and the number of dedup skips.
#[instrument(level = "info", skip_all)]
pub async fn extract_articles(
    config: &CrawlConfig,
    store: &JsonStore,
    fetcher: &Fetcher,
    links_by_year: &[Vec<String>],
) -> Result<(Vec<ArticleRecord>, usize), Box<dyn Error>> {
    let mut appended = Vec::new();
    let mut skipped = 0usize;

    for year_links in links_by_year {
        for link in year_sample(year_links, config.live) {
            let url = match absolute_url(&config.base_url, link) {
                Ok(url) => url,
                Err(e) => {
                    error!(link = %link, error = %e, "Unresolvable report path; skipping report");
                    continue;
                }
            };
            if store.exists_with_success(LEDGER, url.as_str())? {
                info!(%url, "Skipping report, already in ledger with status 200");
                skipped += 1;
                continue;
            }
            match fetcher.get_article(url.as_str()).await {
                Ok(page) => {
                    let record = extract::extract_record(&page.body, url.as_str(), page.status);
                    store.append_item(LEDGER, serde_json::to_value(&record)?)?;
                    appended.push(record);
                }
                Err(e) => error!(%url, error = %e, "Report fetch failed; skipping report"),
            }
        }
        info!("-------------- Finished crawling one more year --------------");
    }

    info!(
        appended = appended.len(),
        skipped, "Finished report extraction"
    );
    Ok((appended, skipped))
}

/// Listing-page paths `{year}?page=1 ..= {year}?page=last`, ascending.
fn synthesize_page_links(year_path: &str, last_page: u32) -> Vec<String> {
    (1..=last_page)
        .map(|n| format!("{year_path}?page={n}"))
        .collect()
}

/// In sampling mode only the first [`SAMPLE_LINKS_PER_YEAR`] links of a year
/// are crawled.
fn year_sample(links: &[String], live: bool) -> &[String] {
    if live {
        links
    } else {
        &links[..links.len().min(SAMPLE_LINKS_PER_YEAR)]
    }
}

fn absolute_url(base: &str, path: &str) -> Result<Url, Box<dyn Error>> {
    Ok(Url::parse(base)?.join(path)?)
}

/// Load a cache artifact written as a bare JSON list. A missing or
/// wrong-shaped artifact (e.g. the `{"items": []}` a first read initializes)
/// yields an empty list plus a warning to rerun with refresh enabled.
fn load_cached_list<T: DeserializeOwned>(
    store: &JsonStore,
    name: &str,
) -> Result<Vec<T>, Box<dyn Error>> {
    let document = store.read(name)?;
    match document {
        Value::Array(_) => Ok(serde_json::from_value(document)?),
        _ => {
            warn!(
                name,
                "Cache artifact is not a list; nothing to replay, rerun with --refresh"
            );
            Ok(Vec::new())
        }
    }
}
