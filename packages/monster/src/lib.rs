#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stat-block document loading, saving and validation.
//!
//! Stat blocks are stored one per file as TOML or JSON. The format is chosen
//! from the file extension on load and by the caller on save. Every loaded
//! document is validated so that downstream estimation only ever sees stat
//! blocks with legal ability scores, a parseable hit-dice expression and a
//! parseable challenge token.

pub mod document;

use monster_cr_monster_models::{Ability, ChallengeParseError, DiceError};

pub use document::{
    DocumentFormat, load_stat_block, parse_stat_block, render_stat_block, save_stat_block,
    slugify, validate_stat_block,
};

/// Errors that can occur while reading or writing stat-block documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding failed.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML encoding failed.
    #[error("TOML render error: {0}")]
    TomlRender(#[from] toml::ser::Error),

    /// The file extension does not name a supported format.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document parsed but failed validation.
    #[error("Invalid stat block '{name}': {reason}")]
    Invalid {
        /// Monster name from the document.
        name: String,
        /// What failed validation.
        reason: InvalidReason,
    },
}

/// Why a parsed stat block was rejected.
#[derive(Debug, thiserror::Error)]
pub enum InvalidReason {
    /// An ability score is outside 1–30.
    #[error("ability score {ability} = {score} is outside 1-30")]
    AbilityScore {
        /// The offending ability.
        ability: Ability,
        /// Its score.
        score: u8,
    },

    /// The armor class is negative.
    #[error("armor class {0} is negative")]
    ArmorClass(i32),

    /// The hit-dice expression does not parse.
    #[error("hitpoints: {0}")]
    HitDice(#[from] DiceError),

    /// The challenge token does not parse.
    #[error("challenge: {0}")]
    Challenge(#[from] ChallengeParseError),

    /// An action's damage expression does not parse.
    #[error("action '{action}': {source}")]
    ActionDamage {
        /// Action name.
        action: String,
        /// Parse failure.
        source: DiceError,
    },
}
