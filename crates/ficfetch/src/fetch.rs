//! Per-work fetcher
//!
//! Retrieves the full-work rendering of a single fan-fiction work and
//! extracts its paragraph text into a raw document file.

use crate::error::FicError;
use scraper::{Html, Selector};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("ficfetch/", env!("CARGO_PKG_VERSION"));

/// Default remote site
pub const DEFAULT_BASE_URL: &str = "https://archiveofourown.org";

/// Selector for paragraph elements inside the work's content container
const WORK_CONTENT_SELECTOR: &str = "div.userstuff p";

/// Separator written after each extracted paragraph
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Fetcher options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Base URL of the remote site (tests point this at a mock server)
    pub base_url: Option<String>,
}

/// Fetches single works and writes their paragraph text to disk
#[derive(Debug, Clone)]
pub struct WorkFetcher {
    client: reqwest::Client,
    base_url: String,
    paragraphs: Selector,
}

impl WorkFetcher {
    /// Create a fetcher with default options
    pub fn new() -> Result<Self, FicError> {
        Self::with_options(FetchOptions::default())
    }

    /// Create a fetcher with custom options
    pub fn with_options(options: FetchOptions) -> Result<Self, FicError> {
        let user_agent = options
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(FicError::ClientBuild)?;
        let paragraphs = Selector::parse(WORK_CONTENT_SELECTOR)
            .map_err(|e| FicError::Selector(e.to_string()))?;

        Ok(Self {
            client,
            base_url: options
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            paragraphs,
        })
    }

    /// Build the full-work, adult-content-visible URL for a work id
    pub fn work_url(&self, id: &str) -> String {
        format!(
            "{}/works/{}?view_full_work=true&view_adult=true",
            self.base_url, id
        )
    }

    /// Fetch one work and write its raw document to `output`
    ///
    /// Each paragraph found in the content container is written followed by
    /// a blank-line separator. Returns the number of paragraphs written.
    /// Transport errors and non-success statuses are fatal; there is no
    /// retry.
    pub async fn fetch_work(&self, id: &str, output: &Path) -> Result<usize, FicError> {
        if id.is_empty() {
            return Err(FicError::MissingId);
        }

        let url = self.work_url(id);
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

        let paragraphs = extract_paragraphs(&body, &self.paragraphs);

        let mut writer = BufWriter::new(File::create(output)?);
        for paragraph in &paragraphs {
            writer.write_all(paragraph.as_bytes())?;
            writer.write_all(PARAGRAPH_SEPARATOR.as_bytes())?;
        }
        writer.flush()?;

        Ok(paragraphs.len())
    }
}

/// Extract the text content of every element matching `selector`
///
/// Synchronous on purpose: `scraper::Html` is not `Send` and must not live
/// across an await point.
pub(crate) fn extract_paragraphs(html: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .map(|element| element.text().collect::<String>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_url() {
        let fetcher = WorkFetcher::new().unwrap();
        assert_eq!(
            fetcher.work_url("12345"),
            "https://archiveofourown.org/works/12345?view_full_work=true&view_adult=true"
        );
    }

    #[test]
    fn test_work_url_custom_base() {
        let fetcher = WorkFetcher::with_options(FetchOptions {
            base_url: Some("http://127.0.0.1:9999".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(fetcher.work_url("1").starts_with("http://127.0.0.1:9999/works/1?"));
    }

    #[test]
    fn test_extract_paragraphs() {
        let html = r#"<html><body>
            <div class="preface"><p>Skip this preface.</p></div>
            <div class="userstuff">
                <p>First <em>paragraph</em>.</p>
                <p>Second paragraph.</p>
            </div>
        </body></html>"#;
        let selector = Selector::parse(WORK_CONTENT_SELECTOR).unwrap();
        let paragraphs = extract_paragraphs(html, &selector);
        assert_eq!(paragraphs, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_extract_paragraphs_no_container() {
        let selector = Selector::parse(WORK_CONTENT_SELECTOR).unwrap();
        assert!(extract_paragraphs("<html><body><p>loose</p></body></html>", &selector).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_work_empty_id() {
        let fetcher = WorkFetcher::new().unwrap();
        let result = fetcher.fetch_work("", Path::new("unused.txt")).await;
        assert!(matches!(result, Err(FicError::MissingId)));
    }
}
