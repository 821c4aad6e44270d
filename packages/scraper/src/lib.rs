#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Generic HTML scraping building blocks.
//!
//! Provides a retrying text fetcher ([`retry`]) and a small extraction-rule
//! schema ([`extract`]) that pulls named fields out of a parsed page with
//! CSS selectors. Every field is evaluated independently, so a layout change
//! that breaks one selector degrades one field instead of the whole record.
//!
//! This crate knows nothing about monsters; callers decide which rules to
//! run and how to interpret the extracted text.

pub mod extract;
pub mod retry;

use std::collections::BTreeMap;
use std::time::Duration;

pub use extract::{Extraction, FieldError, FieldRule, Locator, element_text, extract};
pub use retry::{RetryPolicy, fetch_text};

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status that is not worth retrying, or kept
    /// failing after every retry.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Final status code.
        status: u16,
    },

    /// A URL could not be built or resolved.
    #[error("Invalid URL '{url}': {message}")]
    Url {
        /// The offending URL or link.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// A configured header name or value is invalid.
    #[error("Invalid header: {0}")]
    Header(String),

    /// A CSS selector does not parse.
    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector {
        /// The selector text.
        selector: String,
        /// Parser message.
        message: String,
    },
}

/// Configuration shared by scraping runs.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Base URL of the site being scraped.
    pub url: String,
    /// Additional HTTP headers to include in requests.
    pub headers: BTreeMap<String, String>,
    /// Delay in milliseconds between page fetches.
    pub delay_ms: Option<u64>,
    /// Maximum number of detail pages to fetch.
    pub limit: Option<usize>,
    /// Number of detail pages fetched at once.
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
}

impl ScrapeConfig {
    /// Creates a new `ScrapeConfig` with the given URL and sensible defaults:
    /// sequential fetching, no delay, no limit.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            headers: BTreeMap::new(),
            delay_ms: None,
            limit: None,
            concurrency: 1,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the delay between page fetches.
    #[must_use]
    pub const fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    /// Caps the number of detail pages.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets how many detail pages are fetched at once. Zero is treated as
    /// one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Adds an HTTP header to include in requests.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Returns the configured delay, if any.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Builds a [`reqwest::Client`] with the configured headers and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Header`] for an invalid header and
    /// [`ScrapeError::Http`] if the client cannot be built.
    pub fn build_client(&self) -> Result<reqwest::Client, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Header(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Header(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }
        reqwest::Client::builder()
            .default_headers(header_map)
            .timeout(self.timeout)
            .build()
            .map_err(ScrapeError::Http)
    }

    /// Resolves `link` (absolute or relative) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Url`] if the base URL or the link is invalid.
    pub fn resolve(&self, link: &str) -> Result<String, ScrapeError> {
        let base = reqwest::Url::parse(&self.url).map_err(|e| ScrapeError::Url {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        base.join(link.trim())
            .map(String::from)
            .map_err(|e| ScrapeError::Url {
                url: link.to_owned(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_without_delay() {
        let config = ScrapeConfig::new("http://example.com");
        assert_eq!(config.concurrency, 1);
        assert!(config.delay().is_none());
        assert!(config.limit.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let config = ScrapeConfig::new("http://example.com")
            .with_delay_ms(250)
            .with_limit(3)
            .with_concurrency(0)
            .with_header("User-Agent", "monster-cr");
        assert_eq!(config.delay(), Some(Duration::from_millis(250)));
        assert_eq!(config.limit, Some(3));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.headers["User-Agent"], "monster-cr");
    }

    #[test]
    fn zero_delay_means_no_delay() {
        let config = ScrapeConfig::new("http://example.com").with_delay_ms(0);
        assert!(config.delay().is_none());
    }

    #[test]
    fn resolves_relative_and_absolute_links() {
        let config = ScrapeConfig::new("http://www.example.com/monsters");
        assert_eq!(
            config.resolve("/monsters/gargoyle").unwrap(),
            "http://www.example.com/monsters/gargoyle"
        );
        assert_eq!(
            config.resolve("https://other.example.org/x").unwrap(),
            "https://other.example.org/x"
        );
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let config = ScrapeConfig::new("not a url");
        assert!(matches!(
            config.resolve("/x"),
            Err(ScrapeError::Url { .. })
        ));
    }

    #[test]
    fn invalid_header_is_reported() {
        let config = ScrapeConfig::new("http://example.com").with_header("bad header", "x");
        assert!(matches!(
            config.build_client(),
            Err(ScrapeError::Header(_))
        ));
    }
}
