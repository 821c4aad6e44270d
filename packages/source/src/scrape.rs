//! The scrape loop: listing page, then one detail page per monster, each
//! written to a stat-block document.
//!
//! Detail pages are fetched with bounded concurrency (one at a time by
//! default) and results are handled in listing order. A page that fails to
//! fetch or parse is logged and skipped; the run continues.

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt as _;
use monster_cr_monster::{DocumentFormat, save_stat_block};
use monster_cr_monster_models::MonsterStatBlock;
use monster_cr_scraper::{ScrapeConfig, fetch_text};

use crate::detail::parse_detail_page;
use crate::listing::{MonsterLink, parse_listing};
use crate::progress::ProgressCallback;
use crate::{LISTING_PATH, SourceError};

/// Where and how to scrape.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Fetch settings; `config.url` is the site root.
    pub config: ScrapeConfig,
    /// Path of the listing page relative to the site root.
    pub listing_path: String,
    /// Directory the documents are written to.
    pub out_dir: PathBuf,
    /// Document format.
    pub format: DocumentFormat,
}

impl ScrapeOptions {
    /// Options for `config`, writing TOML documents to `out_dir`.
    #[must_use]
    pub fn new(config: ScrapeConfig, out_dir: PathBuf) -> Self {
        Self {
            config,
            listing_path: LISTING_PATH.to_owned(),
            out_dir,
            format: DocumentFormat::default(),
        }
    }

    /// Overrides the listing path.
    #[must_use]
    pub fn with_listing_path(mut self, path: &str) -> Self {
        path.clone_into(&mut self.listing_path);
        self
    }

    /// Overrides the document format.
    #[must_use]
    pub const fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }
}

/// A detail page that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    /// Monster name from the listing.
    pub name: String,
    /// Detail page URL.
    pub url: String,
    /// Why it was skipped.
    pub error: String,
}

/// Outcome of a scrape run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    /// Monsters found on the listing page (before the limit).
    pub listed: usize,
    /// Documents written, in listing order.
    pub written: Vec<PathBuf>,
    /// Pages that were skipped.
    pub failed: Vec<FailedPage>,
}

/// Fetches and parses one detail page.
///
/// # Errors
///
/// Returns [`SourceError`] if the fetch fails or the page does not parse.
pub async fn fetch_monster(
    client: &reqwest::Client,
    config: &ScrapeConfig,
    link: &MonsterLink,
) -> Result<MonsterStatBlock, SourceError> {
    let html = fetch_text(client, &link.url, config.retry).await?;
    parse_detail_page(&html, &link.name, Some(&link.url))
}

/// Runs a full scrape.
///
/// # Errors
///
/// Returns [`SourceError`] only if the listing page cannot be fetched or
/// parsed; individual monster failures are collected in
/// [`ScrapeSummary::failed`].
pub async fn scrape_monsters(
    options: &ScrapeOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<ScrapeSummary, SourceError> {
    let config = &options.config;
    let client = config.build_client()?;

    let listing_url = config.resolve(&options.listing_path)?;
    log::info!("Fetching monster listing from {listing_url}");
    let listing = fetch_text(&client, &listing_url, config.retry).await?;
    let mut links = parse_listing(&listing, config)?;

    let mut summary = ScrapeSummary {
        listed: links.len(),
        ..ScrapeSummary::default()
    };
    if let Some(limit) = config.limit {
        links.truncate(limit);
    }
    log::info!(
        "Listing has {} monsters; scraping {} (concurrency {})",
        summary.listed,
        links.len(),
        config.concurrency
    );
    progress.set_total(links.len() as u64);

    let delay = config.delay();
    let client = &client;
    let mut results = futures::stream::iter(links.into_iter().enumerate())
        .map(|(index, link)| async move {
            if index > 0
                && let Some(delay) = delay
            {
                tokio::time::sleep(delay).await;
            }
            let result = fetch_monster(client, config, &link).await;
            (link, result)
        })
        .buffered(config.concurrency.max(1));

    while let Some((link, result)) = results.next().await {
        progress.set_message(link.name.clone());
        let saved = result.and_then(|block| {
            save_stat_block(&block, &options.out_dir, options.format).map_err(SourceError::from)
        });
        match saved {
            Ok(path) => {
                log::info!("{} -> {}", link.name, path.display());
                summary.written.push(path);
            }
            Err(e) => {
                log::error!("Skipping {} ({}): {e}", link.name, link.url);
                summary.failed.push(FailedPage {
                    name: link.name,
                    url: link.url,
                    error: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }

    progress.finish(format!(
        "Scraped {} monsters ({} failed)",
        summary.written.len(),
        summary.failed.len()
    ));
    Ok(summary)
}
