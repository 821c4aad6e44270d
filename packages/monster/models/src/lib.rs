#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Monster stat-block types and the canonical challenge-rating ladder.
//!
//! [`MonsterStatBlock`] is the document shape shared by the scraper (which
//! produces it) and the estimator (which consumes it). Field names on the
//! wire keep the stat-block document spelling (`type`, `passive perception`,
//! `legendary actions`), so documents written by hand and documents written
//! by the scraper are interchangeable.

pub mod challenge;
pub mod dice;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use challenge::{ChallengeParseError, ChallengeRating, parse_challenge_value};
pub use dice::{DiceError, DiceExpression, average_roll};

/// The six ability scores.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Ability {
    /// Strength
    #[strum(to_string = "str", serialize = "strength")]
    #[serde(rename = "str")]
    Strength,
    /// Dexterity
    #[strum(to_string = "dex", serialize = "dexterity")]
    #[serde(rename = "dex")]
    Dexterity,
    /// Constitution
    #[strum(to_string = "con", serialize = "constitution")]
    #[serde(rename = "con")]
    Constitution,
    /// Intelligence
    #[strum(to_string = "int", serialize = "intelligence")]
    #[serde(rename = "int")]
    Intelligence,
    /// Wisdom
    #[strum(to_string = "wis", serialize = "wisdom")]
    #[serde(rename = "wis")]
    Wisdom,
    /// Charisma
    #[strum(to_string = "chr", serialize = "cha", serialize = "charisma")]
    #[serde(rename = "chr", alias = "cha")]
    Charisma,
}

impl Ability {
    /// Returns all abilities in stat-block order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Strength,
            Self::Dexterity,
            Self::Constitution,
            Self::Intelligence,
            Self::Wisdom,
            Self::Charisma,
        ]
    }
}

/// Lowest legal ability score.
pub const MIN_ABILITY_SCORE: u8 = 1;

/// Highest legal ability score.
pub const MAX_ABILITY_SCORE: u8 = 30;

/// The six ability scores of a monster.
///
/// A struct rather than a map so that a stat block can never carry more or
/// fewer than the six canonical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    /// Strength score.
    #[serde(rename = "str")]
    pub strength: u8,
    /// Dexterity score.
    #[serde(rename = "dex")]
    pub dexterity: u8,
    /// Constitution score.
    #[serde(rename = "con")]
    pub constitution: u8,
    /// Intelligence score.
    #[serde(rename = "int")]
    pub intelligence: u8,
    /// Wisdom score.
    #[serde(rename = "wis")]
    pub wisdom: u8,
    /// Charisma score.
    #[serde(rename = "chr", alias = "cha")]
    pub charisma: u8,
}

impl AbilityScores {
    /// Returns the score for `ability`.
    #[must_use]
    pub const fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// Sets the score for `ability`.
    pub const fn set(&mut self, ability: Ability, score: u8) {
        match ability {
            Ability::Strength => self.strength = score,
            Ability::Dexterity => self.dexterity = score,
            Ability::Constitution => self.constitution = score,
            Ability::Intelligence => self.intelligence = score,
            Ability::Wisdom => self.wisdom = score,
            Ability::Charisma => self.charisma = score,
        }
    }

    /// Returns the first ability whose score is outside 1–30, if any.
    #[must_use]
    pub fn out_of_range(&self) -> Option<(Ability, u8)> {
        Ability::all()
            .iter()
            .map(|&ability| (ability, self.get(ability)))
            .find(|(_, score)| !(MIN_ABILITY_SCORE..=MAX_ABILITY_SCORE).contains(score))
    }

    /// Returns the ability modifier for `ability` (`floor((score - 10) / 2)`).
    #[must_use]
    pub fn modifier(&self, ability: Ability) -> i32 {
        (i32::from(self.get(ability)) - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

/// Condition and damage-type sets used for immunities and resistances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseSet {
    /// Conditions (e.g. `"poisoned"`, `"exhaustion"`).
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub condition: BTreeSet<String>,
    /// Damage types (e.g. `"poison"`,
    /// `"bludgeoning, piercing, and slashing from nonmagical attacks"`).
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub damage: BTreeSet<String>,
}

impl DefenseSet {
    /// Returns `true` when neither set has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.condition.is_empty() && self.damage.is_empty()
    }
}

/// A named passive trait (e.g. "Keen Smell").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    /// Trait name, lowercased, without the trailing period.
    pub name: String,
    /// Full description text.
    pub text: String,
}

/// An action, reaction or legendary action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Full description text.
    pub text: String,
    /// Damage dice expression (`"2d6+3"`). Empty when the action deals no
    /// damage.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub damage: String,
    /// Attack roll bonus (`+5 to hit` → `5`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_hit: Option<i32>,
    /// Saving-throw DC the action imposes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_dc: Option<i32>,
}

impl Action {
    /// Returns `true` when the action carries a damage expression.
    #[must_use]
    pub fn deals_damage(&self) -> bool {
        !self.damage.trim().is_empty()
    }
}

/// A complete monster stat block.
///
/// Scalar fields come first so the TOML rendering places every plain value
/// before the first table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStatBlock {
    /// Monster name.
    pub name: String,
    /// Size category (e.g. `"medium"`).
    #[serde(default)]
    pub size: String,
    /// Creature type (e.g. `"elemental"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Alignment (e.g. `"chaotic evil"`).
    #[serde(default)]
    pub alignment: String,
    /// Armor class.
    pub armor: i32,
    /// Hit dice expression (e.g. `"7d8+21"`).
    pub hitpoints: String,
    /// Proficiency bonus.
    #[serde(default)]
    pub proficiency: i32,
    /// Passive Perception score.
    #[serde(
        rename = "passive perception",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub passive_perception: Option<u32>,
    /// Listed challenge rating token (`"1/2"`, `"2"`).
    pub challenge: String,
    /// Page the stat block was scraped from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Movement speeds in feet, keyed by mode (`land`, `fly`, `swim`, ...).
    #[serde(default)]
    pub speed: BTreeMap<String, u32>,
    /// Ability scores.
    pub stats: AbilityScores,
    /// Saving throw modifiers keyed by ability abbreviation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saves: Option<BTreeMap<String, i32>>,
    /// Skill modifiers keyed by lowercased skill name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeMap<String, i32>>,
    /// Condition and damage immunities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immunities: Option<DefenseSet>,
    /// Damage resistances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistances: Option<DefenseSet>,
    /// Special senses and their ranges in feet (`darkvision = 60`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senses: Option<BTreeMap<String, u32>>,
    /// Passive traits in page order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<Trait>,
    /// Actions keyed by lowercased action name.
    #[serde(default)]
    pub actions: BTreeMap<String, Action>,
    /// Reactions keyed by lowercased name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reactions: BTreeMap<String, Action>,
    /// Legendary actions keyed by lowercased name.
    #[serde(
        rename = "legendary actions",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub legendary_actions: BTreeMap<String, Action>,
}

impl MonsterStatBlock {
    /// Parses the listed challenge token into its numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeParseError`] if the token is malformed.
    pub fn challenge_value(&self) -> Result<f64, ChallengeParseError> {
        parse_challenge_value(&self.challenge)
    }
}
