//! Defensive challenge rating: hit points adjusted by armor class.

use monster_cr_balance::BalanceTable;
use monster_cr_balance_models::{ExactColumn, RangeColumn};
use monster_cr_monster_models::{ChallengeRating, average_roll};
use serde::Serialize;

use crate::{EstimateError, LookupPolicy, adjust_toward, exact_tier, range_tier};

/// Defensive half of an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DefensiveEstimate {
    /// Heuristic average of the hit dice.
    pub expected_hitpoints: i64,
    /// Tier whose hit-point range contains the expected hit points.
    pub hitpoints_cr: ChallengeRating,
    /// First tier with the monster's armor class.
    pub armor_class_cr: ChallengeRating,
    /// Hit-point tier adjusted toward the armor-class tier.
    pub cr: f64,
}

/// Estimates defensive CR from a hit-dice expression and armor class.
///
/// # Errors
///
/// Returns [`EstimateError::Dice`] if `hitpoints` does not parse and
/// [`EstimateError::LookupMiss`] if a lookup misses under
/// [`LookupPolicy::Error`].
pub fn estimate_defensive(
    hitpoints: &str,
    armor_class: i32,
    table: &BalanceTable,
    policy: LookupPolicy,
) -> Result<DefensiveEstimate, EstimateError> {
    let expected_hitpoints = average_roll(hitpoints).map_err(|source| EstimateError::Dice {
        field: "hitpoints".to_owned(),
        source,
    })?;

    let hitpoints_cr = range_tier(table, RangeColumn::Hitpoints, expected_hitpoints, policy)?;
    let armor_class_cr = exact_tier(table, ExactColumn::ArmorClass, armor_class, policy)?;
    let cr = adjust_toward(hitpoints_cr.value(), armor_class_cr.value());

    log::debug!(
        "Defensive: {hitpoints} -> {expected_hitpoints} hp (CR {hitpoints_cr}), \
         AC {armor_class} (CR {armor_class_cr}) -> {cr}"
    );

    Ok(DefensiveEstimate {
        expected_hitpoints,
        hitpoints_cr,
        armor_class_cr,
        cr,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use monster_cr_balance::{default_table, parse_table};

    use super::*;

    const HEADER: &str =
        "cr,proficiency_bonus,armor_class,hitpoints,attack_bonus,average_damage,save_dc\n";

    fn table(rows: &str) -> BalanceTable {
        parse_table(format!("{HEADER}{rows}").as_bytes()).unwrap()
    }

    #[test]
    fn matching_tiers_need_no_adjustment() {
        let table = table("0,2,10,1-5,3,0-1,13\n1/2,2,12,6-25,3,2-3,13\n1,2,13,26-50,3,4-5,13\n");
        // 4d6+2: (6 + 26) / 2 = 16
        let estimate = estimate_defensive("4d6+2", 12, &table, LookupPolicy::Error).unwrap();
        assert_eq!(estimate.expected_hitpoints, 16);
        assert_eq!(estimate.hitpoints_cr.to_string(), "1/2");
        assert_eq!(estimate.armor_class_cr.to_string(), "1/2");
        assert!((estimate.cr - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn high_armor_pulls_rating_up() {
        let table = default_table().unwrap();
        // 2d8+2: (4 + 18) / 2 = 11 hp -> CR 1/8; AC 17 -> CR 10
        let estimate = estimate_defensive("2d8+2", 17, &table, LookupPolicy::Error).unwrap();
        assert_eq!(estimate.hitpoints_cr.to_string(), "1/8");
        assert_eq!(estimate.armor_class_cr.to_string(), "10");
        // 0.125 - trunc((0.125 - 10) / 2) = 0.125 + 4
        assert!((estimate.cr - 4.125).abs() < f64::EPSILON);
    }

    #[test]
    fn low_armor_pulls_rating_down() {
        let table = default_table().unwrap();
        // 20d10+40: (60 + 240) / 2 = 150 hp -> CR 6; AC 13 -> CR 0
        let estimate = estimate_defensive("20d10+40", 13, &table, LookupPolicy::Error).unwrap();
        assert_eq!(estimate.hitpoints_cr.to_string(), "6");
        assert!((estimate.cr - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monotonic_in_hitpoints_for_every_armor_class() {
        let table = default_table().unwrap();
        let armor_classes: BTreeSet<i32> = table
            .rows()
            .iter()
            .map(|row| row.armor_class)
            .collect();
        for armor_class in armor_classes {
            let mut previous = f64::NEG_INFINITY;
            for hitpoints in 1..=900_i32 {
                // 1d1+K averages to exactly 1 + K
                let dice = format!("1d1{:+}", hitpoints - 1);
                let estimate =
                    estimate_defensive(&dice, armor_class, &table, LookupPolicy::Error).unwrap();
                assert_eq!(estimate.expected_hitpoints, i64::from(hitpoints));
                assert!(
                    estimate.cr >= previous,
                    "{hitpoints} hp at AC {armor_class}: {} < {previous}",
                    estimate.cr
                );
                previous = estimate.cr;
            }
        }
    }

    #[test]
    fn hitpoint_gap_is_a_lookup_miss() {
        let table = table("1,2,12,1-10,3,0-5,13\n2,2,13,20-30,3,6-9,13\n");
        // 3d6: (3 + 18) / 2 = 10 -> fine; 4d6: (4 + 24) / 2 = 14 -> gap
        assert!(estimate_defensive("3d6", 12, &table, LookupPolicy::Error).is_ok());
        let err = estimate_defensive("4d6", 12, &table, LookupPolicy::Error).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::LookupMiss { ref column, value: 14 } if column == "hitpoints"
        ));
    }

    #[test]
    fn clamp_policy_uses_nearest_tier() {
        let table = table("1,2,12,1-10,3,0-5,13\n2,2,13,20-30,3,6-9,13\n");
        // 14 hp is 4 from tier 1 and 6 from tier 2
        let estimate = estimate_defensive("4d6", 14, &table, LookupPolicy::Clamp).unwrap();
        assert_eq!(estimate.hitpoints_cr.to_string(), "1");
        assert_eq!(estimate.armor_class_cr.to_string(), "2");
    }

    #[test]
    fn malformed_hit_dice_is_a_parse_error() {
        let table = default_table().unwrap();
        assert!(matches!(
            estimate_defensive("52", 13, &table, LookupPolicy::Error),
            Err(EstimateError::Dice { .. })
        ));
    }
}
