//! Site-search crawl variant
//!
//! Two coordinated passes: a listing-page crawl discovers work links, then
//! the discovered works are fetched with bounded parallelism and a random
//! inter-request delay to respect the remote site's load. Extracted
//! container text is appended to a single output file through one writer
//! task, so concurrent fetches never interleave within the file.

use crate::error::FicError;
use crate::fetch::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use rand::Rng;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};
use url::Url;

/// Selector for the work's whole content container
const CONTAINER_SELECTOR: &str = "div.userstuff";

/// Selector for candidate work links on a listing page
const LINK_SELECTOR: &str = "a[href]";

/// Default number of concurrent work fetches
pub const DEFAULT_PARALLELISM: usize = 2;

/// Default upper bound for the random inter-request delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Search crawler options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Base URL used to build per-work fetch URLs
    pub base_url: Option<String>,
    /// Concurrent fetch limit
    pub parallelism: usize,
    /// Upper bound for the random pre-request delay
    pub max_delay: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            base_url: None,
            parallelism: DEFAULT_PARALLELISM,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Crawls a listing page and fetches every discovered work
#[derive(Debug, Clone)]
pub struct SearchCrawler {
    client: reqwest::Client,
    base_url: String,
    links: Selector,
    container: Selector,
    parallelism: usize,
    max_delay: Duration,
}

impl SearchCrawler {
    /// Create a crawler with default options
    pub fn new() -> Result<Self, FicError> {
        Self::with_options(SearchOptions::default())
    }

    /// Create a crawler with custom options
    pub fn with_options(options: SearchOptions) -> Result<Self, FicError> {
        let user_agent = options
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(FicError::ClientBuild)?;
        let links =
            Selector::parse(LINK_SELECTOR).map_err(|e| FicError::Selector(e.to_string()))?;
        let container =
            Selector::parse(CONTAINER_SELECTOR).map_err(|e| FicError::Selector(e.to_string()))?;

        Ok(Self {
            client,
            base_url: options
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            links,
            container,
            parallelism: options.parallelism.max(1),
            max_delay: options.max_delay,
        })
    }

    /// Crawl a listing page and append every discovered work's container
    /// text to `output`
    ///
    /// A listing-page error is fatal; a per-work fetch error is logged and
    /// skipped. Returns the number of distinct works discovered. Write
    /// ordering across works follows fetch completion, not discovery
    /// order.
    pub async fn search(&self, listing_url: &str, output: &Path) -> Result<usize, FicError> {
        let listing_url =
            Url::parse(listing_url).map_err(|_| FicError::InvalidUrl(listing_url.to_string()))?;
        info!(url = %listing_url, "crawling listing page");
        let response = self
            .client
            .get(listing_url.clone())
            .send()
            .await
            .map_err(FicError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FicError::Status {
                url: listing_url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(FicError::from_reqwest)?;

        let ids = work_ids_from_listing(&body, &self.links);
        let found = ids.len();
        info!(found, "works discovered");

        // Single writer task serializes appends to the output file.
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(output)
            .await?;
        let (tx, mut rx) = mpsc::channel::<String>(self.parallelism);
        let writer = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                file.write_all(chunk.as_bytes()).await?;
            }
            file.flush().await?;
            Ok::<(), std::io::Error>(())
        });

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut workers = Vec::with_capacity(found);
        for id in ids {
            let crawler = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            workers.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                match crawler.fetch_container_text(&id).await {
                    Ok(text) => {
                        if tx.send(text).await.is_err() {
                            warn!(id = %id, "writer task gone, dropping work text");
                        }
                    }
                    Err(e) => warn!(id = %id, error = %e, "work fetch failed"),
                }
            }));
        }
        drop(tx);

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "worker task panicked");
            }
        }
        match writer.await {
            Ok(result) => result?,
            Err(e) => warn!(error = %e, "writer task panicked"),
        }

        Ok(found)
    }

    /// Fetch one work's full-work page and return its container text
    async fn fetch_container_text(&self, id: &str) -> Result<String, FicError> {
        // Politeness: randomized delay before each request
        let delay_ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(0..=self.max_delay.as_millis() as u64)
        };
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        let url = format!(
            "{}/works/{}?view_full_work=true&view_adult=true",
            self.base_url, id
        );
        info!(%url, "retrieving work");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FicError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FicError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(FicError::from_reqwest)?;

        Ok(container_text(&body, &self.container))
    }
}

/// Extract distinct work ids from a listing page
///
/// Keeps links of the exact shape `/works/<id>` where `<id>` carries no
/// query or fragment and is not the `search` pseudo-path. Each id is
/// returned at most once per listing page.
fn work_ids_from_listing(html: &str, links: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for element in document.select(links) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains("/works/") {
            continue;
        }
        let parts: Vec<&str> = href.split('/').collect();
        if parts.len() != 3 {
            continue;
        }
        let id = parts[2];
        if id.is_empty() || id.contains(['?', '#']) || id == "search" {
            continue;
        }
        if seen.insert(id.to_string()) {
            ids.push(id.to_string());
        }
    }

    ids
}

/// Concatenated text of every content container in the page
fn container_text(html: &str, container: &Selector) -> String {
    let document = Html::parse_document(html);
    document
        .select(container)
        .map(|element| element.text().collect::<String>())
        .collect()
}
