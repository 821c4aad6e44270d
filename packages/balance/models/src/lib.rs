#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Balancing-table row and range types.
//!
//! A balancing table maps metric ranges (hit points, damage per round) and
//! exact values (armor class, attack bonus, save DC) to challenge-rating
//! tiers. One [`BalanceRow`] describes one tier.

use std::fmt;
use std::str::FromStr;

use monster_cr_monster_models::ChallengeRating;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Token that marks an unbounded upper end in a range cell.
pub const UNBOUNDED: &str = "*";

/// Errors produced while parsing a range cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeParseError {
    /// The cell is not `low-high`, `low-*` or a single number.
    #[error("malformed range '{0}' (expected low-high)")]
    Malformed(String),

    /// The upper bound is below the lower bound.
    #[error("range '{0}' is inverted")]
    Inverted(String),
}

/// An inclusive integer range whose upper bound may be unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatRange {
    /// Inclusive lower bound.
    pub low: i64,
    /// Inclusive upper bound; `None` means unbounded.
    pub high: Option<i64>,
}

impl StatRange {
    /// Creates a bounded range.
    #[must_use]
    pub const fn new(low: i64, high: i64) -> Self {
        Self {
            low,
            high: Some(high),
        }
    }

    /// Creates a range with no upper bound.
    #[must_use]
    pub const fn from_low(low: i64) -> Self {
        Self { low, high: None }
    }

    /// Returns `true` if `value` lies within the range (both ends inclusive).
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        value >= self.low && self.high.is_none_or(|high| value <= high)
    }

    /// Distance from `value` to the closest point of the range; `0` when the
    /// range contains it.
    #[must_use]
    pub fn distance(&self, value: i64) -> u64 {
        if value < self.low {
            self.low.abs_diff(value)
        } else {
            match self.high {
                Some(high) if value > high => value.abs_diff(high),
                _ => 0,
            }
        }
    }
}

impl fmt::Display for StatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.high {
            Some(high) => write!(f, "{}-{high}", self.low),
            None => write!(f, "{}-{UNBOUNDED}", self.low),
        }
    }
}

impl FromStr for StatRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cell = s.trim();
        let malformed = || RangeParseError::Malformed(cell.to_owned());

        let Some((low, high)) = cell.split_once('-') else {
            let value: i64 = cell.parse().map_err(|_| malformed())?;
            return Ok(Self::new(value, value));
        };

        let low: i64 = low.trim().parse().map_err(|_| malformed())?;
        let high = high.trim();

        if high == UNBOUNDED {
            return Ok(Self::from_low(low));
        }

        let high: i64 = high.parse().map_err(|_| malformed())?;
        if high < low {
            return Err(RangeParseError::Inverted(cell.to_owned()));
        }
        Ok(Self::new(low, high))
    }
}

impl TryFrom<String> for StatRange {
    type Error = RangeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatRange> for String {
    fn from(value: StatRange) -> Self {
        value.to_string()
    }
}

/// Range-valued balancing columns.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RangeColumn {
    /// Expected hit points.
    Hitpoints,
    /// Average damage per round.
    AverageDamage,
}

/// Exact-valued balancing columns.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExactColumn {
    /// Armor class.
    ArmorClass,
    /// Attack roll bonus.
    AttackBonus,
    /// Saving-throw DC.
    SaveDc,
}

/// One challenge-rating tier of the balancing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    /// Challenge rating of this tier.
    pub cr: ChallengeRating,
    /// Expected hit points for the tier.
    pub hitpoints: StatRange,
    /// Expected armor class.
    pub armor_class: i32,
    /// Expected damage per round.
    pub average_damage: StatRange,
    /// Proficiency bonus.
    pub proficiency_bonus: i32,
    /// Expected attack bonus.
    pub attack_bonus: i32,
    /// Expected saving-throw DC.
    pub save_dc: i32,
}

impl BalanceRow {
    /// Returns the range stored in `column`.
    #[must_use]
    pub const fn range(&self, column: RangeColumn) -> StatRange {
        match column {
            RangeColumn::Hitpoints => self.hitpoints,
            RangeColumn::AverageDamage => self.average_damage,
        }
    }

    /// Returns the value stored in `column`.
    #[must_use]
    pub const fn exact(&self, column: ExactColumn) -> i32 {
        match column {
            ExactColumn::ArmorClass => self.armor_class,
            ExactColumn::AttackBonus => self.attack_bonus,
            ExactColumn::SaveDc => self.save_dc,
        }
    }
}
