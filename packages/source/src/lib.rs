#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Monster stat-block source: the listing page, the detail pages and the
//! scrape loop that turns them into stat-block documents.
//!
//! - [`listing`] pairs monster names with detail links.
//! - [`detail`] extracts a [`MonsterStatBlock`](monster_cr_monster_models::MonsterStatBlock)
//!   from a detail page with named extraction rules.
//! - [`fields`] and [`attack`] parse the text of individual fields.
//! - [`scrape`] drives the whole run and reports through [`progress`].

pub mod attack;
pub mod detail;
pub mod fields;
pub mod listing;
pub mod progress;
pub mod scrape;

use monster_cr_monster::DocumentError;
use monster_cr_scraper::{FieldError, ScrapeError};

pub use detail::parse_detail_page;
pub use listing::{MonsterLink, parse_listing};
pub use scrape::{FailedPage, ScrapeOptions, ScrapeSummary, fetch_monster, scrape_monsters};

/// Site scraped when no base URL is given.
pub const DEFAULT_BASE_URL: &str = "http://www.orcpub.com";

/// Path of the monster listing page.
pub const LISTING_PATH: &str = "/dungeons-and-dragons/5th-edition/monsters";

/// Errors that can occur while scraping monsters.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Fetching a page failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// Writing or validating a stat block failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The listing page could not be interpreted.
    #[error("Listing error: {0}")]
    Listing(String),

    /// Required fields of a detail page are missing or malformed.
    #[error("Page for '{name}' is unusable: {}", join_errors(errors))]
    Page {
        /// Monster name.
        name: String,
        /// One error per failing required field.
        errors: Vec<FieldError>,
    },
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
