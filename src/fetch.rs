//! Rate-limited HTTP fetch layer.
//!
//! Every outbound request to the archive goes through a shared
//! [`RateLimiter`]: a sliding-window throttle whose `acquire()` blocks
//! (sleeps) until a call slot frees, so the fetch layer delays but never
//! raises a rate-limit error. Two throttle domains exist:
//!
//! - page discovery (archive index, year pages, listing pages): 5 calls/s
//! - full article fetches: 1 call per 5 s
//!
//! A non-200 response is logged and the body is still returned; the caller
//! records the status it received. There is no in-run retry: a failed
//! article lands in the ledger with its status and stays eligible for a
//! replay on the next run, because dedup only honors 200 records.

use reqwest::header::{HeaderMap, HeaderValue, FROM, USER_AGENT};
use std::collections::VecDeque;
use std::error::Error;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, instrument, warn};

use crate::config::CrawlConfig;

/// Maximum page-discovery calls per one-second window.
pub const FOLLOW_LINK_RATE: usize = 5;

/// Article fetches are throttled to one per this many seconds.
pub const ARTICLE_FETCH_PERIOD_SECS: u64 = 5;

/// A sliding-window call throttle with a blocking `acquire()`.
///
/// At most `max_calls` acquisitions proceed within any `period`-long window;
/// an exhausted window makes the caller sleep until the oldest recorded call
/// ages out. One shared instance per throttle domain, so tests can
/// substitute a wide-open limiter.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, period: Duration) -> Self {
        Self {
            max_calls,
            period,
            window: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Block until a call slot is free, then claim it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = window.front() {
                    if now.duration_since(oldest) >= self.period {
                        window.pop_front();
                    } else {
                        break;
                    }
                }
                if window.len() < self.max_calls {
                    window.push_back(now);
                    return;
                }
                // Oldest entry decides when the next slot opens.
                self.period - now.duration_since(*window.front().unwrap())
            };
            debug!(?wait, "Rate limit window exhausted; sleeping");
            sleep(wait).await;
        }
    }
}

/// A fetched page: the HTTP status received and the (possibly error) body.
#[derive(Debug)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Shared HTTP client plus the two throttle domains.
///
/// All requests carry the fixed identifying `User-Agent`/`From` header pair
/// the archive operator expects from this crawler.
#[derive(Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    page_limiter: RateLimiter,
    article_limiter: RateLimiter,
}

impl Fetcher {
    /// Build a fetcher from the crawl configuration.
    pub fn new(config: &CrawlConfig) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(FROM, HeaderValue::from_str(&config.contact)?);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            page_limiter: RateLimiter::new(FOLLOW_LINK_RATE, Duration::from_secs(1)),
            article_limiter: RateLimiter::new(
                1,
                Duration::from_secs(ARTICLE_FETCH_PERIOD_SECS),
            ),
        })
    }

    /// Fetch a listing or index page under the page-discovery throttle.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_page(&self, url: &str) -> Result<FetchedPage, Box<dyn Error>> {
        self.page_limiter.acquire().await;
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            error!(%url, status, "Listing fetch returned non-200");
        }
        Ok(FetchedPage { status, body })
    }

    /// Fetch an article page under the stricter article throttle.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_article(&self, url: &str) -> Result<FetchedPage, Box<dyn Error>> {
        self.article_limiter.acquire().await;
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            warn!(%url, status, "Article fetch returned non-200");
        }
        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_limiter_allows_burst_up_to_max_calls() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));

        let t0 = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_blocks_when_window_exhausted() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        let t0 = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(t0.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_frees_slots_as_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_secs(5));

        limiter.acquire().await;
        sleep(Duration::from_secs(5)).await;

        let t0 = Instant::now();
        limiter.acquire().await;
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }
}
