#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Challenge-rating estimation.
//!
//! A monster's CR is approximated from two independent halves:
//!
//! - **defensive** ([`defensive`]): the hit-point tier, nudged toward the
//!   armor-class tier;
//! - **offensive** ([`offensive`]): the damage-per-round tier, nudged toward
//!   the attack-bonus tier.
//!
//! Each half keeps its primary tier and moves half the distance toward the
//! secondary tier, rounding the adjustment toward zero. The two halves are
//! averaged and snapped to the challenge-rating ladder
//! ([`estimate_challenge`]).

pub mod config;
pub mod defensive;
pub mod offensive;

use monster_cr_balance::BalanceTable;
use monster_cr_balance_models::{ExactColumn, RangeColumn};
use monster_cr_monster_models::{ChallengeRating, DiceError, MonsterStatBlock};
use serde::Serialize;

pub use config::{ConfigError, DamagePolicy, EstimatorConfig, LookupPolicy};
pub use defensive::{DefensiveEstimate, estimate_defensive};
pub use offensive::{OffensiveEstimate, estimate_offensive};

/// Errors that can occur during estimation.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    /// A dice expression in the stat block does not parse.
    #[error("Parse error in {field}: {source}")]
    Dice {
        /// Which stat-block field held the expression.
        field: String,
        /// Parse failure.
        source: DiceError,
    },

    /// No balancing row matched a queried value.
    #[error("No balancing-table row matches {column} = {value}")]
    LookupMiss {
        /// Column that was searched.
        column: String,
        /// Value that was searched for.
        value: i64,
    },

    /// Per-round damage does not fit the supported integer range.
    #[error("Damage per round under policy '{policy}' is out of range")]
    DamageOverflow {
        /// Policy that produced the value.
        policy: DamagePolicy,
    },

    /// No action carries a damage expression.
    #[error("No damaging actions: offensive CR needs at least one action with damage")]
    NoDamagingActions,

    /// No action carries a to-hit bonus or a save DC.
    #[error("No attack bonus or save DC on any action")]
    NoAttackBonus,
}

/// The full result of an estimation, with every intermediate value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrEstimate {
    /// Defensive half.
    pub defensive: DefensiveEstimate,
    /// Offensive half.
    pub offensive: OffensiveEstimate,
    /// Unrounded mean of the two halves.
    pub mean: f64,
    /// Mean rounded down to a whole number.
    pub floored: f64,
    /// Mean snapped to the challenge-rating ladder.
    pub rating: ChallengeRating,
}

/// Moves `primary` half the way toward `secondary`, truncating the step
/// toward zero: `primary - trunc((primary - secondary) / 2)`.
///
/// The result never lands further than halfway from `primary` and is
/// non-decreasing in `primary`.
#[must_use]
pub fn adjust_toward(primary: f64, secondary: f64) -> f64 {
    primary - ((primary - secondary) / 2.0).trunc()
}

/// Combines the two halves. Returns `(mean, floor(mean), snapped rating)`.
#[must_use]
pub fn combine(offensive: f64, defensive: f64) -> (f64, f64, ChallengeRating) {
    let mean = (offensive + defensive) / 2.0;
    (mean, mean.floor(), ChallengeRating::nearest(mean))
}

/// Estimates the challenge rating of `block` against `table`.
///
/// # Errors
///
/// Returns [`EstimateError`] if a dice expression is malformed, a lookup
/// misses under [`LookupPolicy::Error`], or the monster has no damaging
/// action or attack bonus.
pub fn estimate_challenge(
    block: &MonsterStatBlock,
    table: &BalanceTable,
    config: EstimatorConfig,
) -> Result<CrEstimate, EstimateError> {
    let defensive = estimate_defensive(
        &block.hitpoints,
        block.armor,
        table,
        config.lookup_policy,
    )?;
    let offensive = estimate_offensive(&block.actions, table, config)?;

    let (mean, floored, rating) = combine(offensive.cr, defensive.cr);

    log::info!(
        "{}: offensive CR {} / defensive CR {} -> estimated CR {rating} (listed {})",
        block.name,
        offensive.cr,
        defensive.cr,
        block.challenge
    );

    Ok(CrEstimate {
        defensive,
        offensive,
        mean,
        floored,
        rating,
    })
}

/// Looks up the tier for a range column, honouring `policy` on a miss.
pub(crate) fn range_tier(
    table: &BalanceTable,
    column: RangeColumn,
    value: i64,
    policy: LookupPolicy,
) -> Result<ChallengeRating, EstimateError> {
    match policy {
        LookupPolicy::Error => table
            .first_in_range(column, value)
            .map(|row| row.cr)
            .ok_or_else(|| EstimateError::LookupMiss {
                column: column.to_string(),
                value,
            }),
        LookupPolicy::Clamp => {
            let row = table.nearest_in_range(column, value);
            if !row.range(column).contains(value) {
                log::warn!(
                    "No tier contains {column} = {value}; clamping to CR {} ({})",
                    row.cr,
                    row.range(column)
                );
            }
            Ok(row.cr)
        }
    }
}

/// Looks up the tier for an exact-valued column, honouring `policy` on a
/// miss.
pub(crate) fn exact_tier(
    table: &BalanceTable,
    column: ExactColumn,
    value: i32,
    policy: LookupPolicy,
) -> Result<ChallengeRating, EstimateError> {
    match policy {
        LookupPolicy::Error => table
            .first_exact(column, value)
            .map(|row| row.cr)
            .ok_or_else(|| EstimateError::LookupMiss {
                column: column.to_string(),
                value: i64::from(value),
            }),
        LookupPolicy::Clamp => {
            let row = table.nearest_exact(column, value);
            if row.exact(column) != value {
                log::warn!(
                    "No tier has {column} = {value}; clamping to CR {} ({column} {})",
                    row.cr,
                    row.exact(column)
                );
            }
            Ok(row.cr)
        }
    }
}

#[cfg(test)]
mod tests {
    use monster_cr_balance::default_table;
    use monster_cr_monster::{DocumentFormat, parse_stat_block};

    use super::*;

    const GARGOYLE: &str = include_str!("../../monster/fixtures/gargoyle.toml");

    #[test]
    fn adjustment_truncates_the_step_toward_zero() {
        // step (2 - 5) / 2 = -1.5 truncates to -1
        assert!((adjust_toward(2.0, 5.0) - 3.0).abs() < f64::EPSILON);
        // step (5 - 2) / 2 = 1.5 truncates to 1
        assert!((adjust_toward(5.0, 2.0) - 4.0).abs() < f64::EPSILON);
        assert!((adjust_toward(3.0, 3.0) - 3.0).abs() < f64::EPSILON);
        // step (0.5 - 5) / 2 = -2.25 truncates to -2
        assert!((adjust_toward(0.5, 5.0) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn adjustment_stays_on_the_primary_side() {
        let ladder = [0.0, 0.125, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 30.0];
        for primary in ladder {
            for secondary in ladder {
                let adjusted = adjust_toward(primary, secondary);
                let halfway = f64::midpoint(primary, secondary);
                assert!(
                    (adjusted - primary).abs() <= (halfway - primary).abs(),
                    "{primary} toward {secondary} -> {adjusted}"
                );
            }
        }
    }

    #[test]
    fn combine_reports_mean_floor_and_snap() {
        let (mean, floored, rating) = combine(2.0, 3.5);
        assert!((mean - 2.75).abs() < f64::EPSILON);
        assert!((floored - 2.0).abs() < f64::EPSILON);
        assert_eq!(rating.to_string(), "3");

        let (_, floored, rating) = combine(0.5, 0.25);
        assert!(floored.abs() < f64::EPSILON);
        assert_eq!(rating.to_string(), "1/4");
    }

    #[test]
    fn estimates_gargoyle_end_to_end() {
        let block = parse_stat_block(GARGOYLE, DocumentFormat::Toml).unwrap();
        let table = default_table().unwrap();
        let estimate = estimate_challenge(&block, &table, EstimatorConfig::default()).unwrap();

        // 7d8+21: (28 + 77) / 2 = 52 -> CR 1/2; AC 15 -> CR 5
        assert_eq!(estimate.defensive.expected_hitpoints, 52);
        assert_eq!(estimate.defensive.hitpoints_cr.to_string(), "1/2");
        assert_eq!(estimate.defensive.armor_class_cr.to_string(), "5");
        // 0.5 - trunc((0.5 - 5) / 2) = 0.5 + 2
        assert!((estimate.defensive.cr - 2.5).abs() < f64::EPSILON);

        // bite + claws: 5 + 5 = 10 -> CR 1; +4 to hit -> CR 3
        assert_eq!(estimate.offensive.damage_per_round, 10);
        assert_eq!(estimate.offensive.damage_cr.to_string(), "1");
        assert_eq!(estimate.offensive.attack_cr.to_string(), "3");
        // 1 - trunc((1 - 3) / 2) = 1 + 1
        assert!((estimate.offensive.cr - 2.0).abs() < f64::EPSILON);

        assert!((estimate.mean - 2.25).abs() < f64::EPSILON);
        assert!((estimate.floored - 2.0).abs() < f64::EPSILON);
        assert_eq!(estimate.rating.to_string(), "2");
    }

    #[test]
    fn estimate_serializes_for_reporting() {
        let block = parse_stat_block(GARGOYLE, DocumentFormat::Toml).unwrap();
        let table = default_table().unwrap();
        let estimate = estimate_challenge(&block, &table, EstimatorConfig::default()).unwrap();
        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["rating"], "2");
        assert_eq!(json["offensive"]["attack_column"], "attack_bonus");
    }

    #[test]
    fn lookup_miss_is_reported_not_zeroed() {
        let block = parse_stat_block(
            &GARGOYLE.replace("armor = 15", "armor = 12"),
            DocumentFormat::Toml,
        )
        .unwrap();
        let table = default_table().unwrap();
        let err = estimate_challenge(&block, &table, EstimatorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::LookupMiss { ref column, value: 12 } if column == "armor_class"
        ));

        let clamped = estimate_challenge(
            &block,
            &table,
            EstimatorConfig::default().with_lookup_policy(LookupPolicy::Clamp),
        )
        .unwrap();
        assert_eq!(clamped.defensive.armor_class_cr, ChallengeRating::ZERO);
    }
}
