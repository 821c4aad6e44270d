//! Monster listing page.
//!
//! The listing shows one card per monster. Names and links live in separate
//! parts of the markup, so they are extracted independently and paired by
//! position. The first name on the page belongs to the page title and is
//! dropped.

use monster_cr_scraper::{FieldRule, ScrapeConfig, extract};
use scraper::Html;

use crate::SourceError;

/// Selector for monster names. The first match is the page title.
pub const NAME_SELECTOR: &str = "strong[itemprop=name]";

/// Selector for monster detail links.
pub const LINK_SELECTOR: &str = "div.lv-body > div > a[href]";

/// A monster name paired with its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterLink {
    /// Display name.
    pub name: String,
    /// Absolute URL of the detail page.
    pub url: String,
}

/// Parses the listing page into name/link pairs, in page order.
///
/// When the name and link counts differ, the unmatched tail is skipped with
/// a warning.
///
/// # Errors
///
/// Returns [`SourceError::Scrape`] if a link cannot be resolved against the
/// base URL.
pub fn parse_listing(html: &str, config: &ScrapeConfig) -> Result<Vec<MonsterLink>, SourceError> {
    let document = Html::parse_document(html);

    let names: Vec<String> = extract(&document, &[FieldRule::css("name", NAME_SELECTOR)])
        .all("name")
        .iter()
        .skip(1)
        .cloned()
        .collect();

    let link_rule = FieldRule::css("link", LINK_SELECTOR);
    let hrefs: Vec<&str> = link_rule
        .select(&document)
        .map_err(|e| SourceError::Listing(e.to_string()))?
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .collect();

    if names.len() != hrefs.len() {
        log::warn!(
            "Listing has {} names but {} links; skipping {} unmatched entries",
            names.len(),
            hrefs.len(),
            names.len().abs_diff(hrefs.len())
        );
    }

    names
        .into_iter()
        .zip(hrefs)
        .map(|(name, href)| {
            Ok(MonsterLink {
                name,
                url: config.resolve(href)?,
            })
        })
        .collect()
}
