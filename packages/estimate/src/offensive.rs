//! Offensive challenge rating: damage per round adjusted by attack bonus.

use std::collections::BTreeMap;

use monster_cr_balance::BalanceTable;
use monster_cr_balance_models::{ExactColumn, RangeColumn};
use monster_cr_monster_models::{Action, ChallengeRating, average_roll};
use serde::Serialize;

use crate::{
    DamagePolicy, EstimateError, EstimatorConfig, adjust_toward, exact_tier, range_tier,
};

/// Offensive half of an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OffensiveEstimate {
    /// Number of actions that carry damage.
    pub damaging_actions: usize,
    /// Per-round damage under the configured [`DamagePolicy`].
    pub damage_per_round: i64,
    /// Tier whose damage range contains `damage_per_round`.
    pub damage_cr: ChallengeRating,
    /// Column the attack value was matched against.
    pub attack_column: ExactColumn,
    /// Best to-hit bonus, or best save DC when no action has a to-hit bonus.
    pub attack_value: i32,
    /// First tier with `attack_value` in `attack_column`.
    pub attack_cr: ChallengeRating,
    /// Damage tier adjusted toward the attack tier.
    pub cr: f64,
}

/// Expected damage of each damaging action.
#[derive(Debug, Default)]
struct DamageTally {
    count: i64,
    sum: i128,
    max: i64,
}

impl DamageTally {
    fn per_round(&self, policy: DamagePolicy) -> Result<i64, EstimateError> {
        let per_round = match policy {
            DamagePolicy::Sum => self.sum,
            DamagePolicy::Max => i128::from(self.max),
            DamagePolicy::Mean => self.sum.div_euclid(i128::from(self.count)),
            DamagePolicy::MaxOverCount => i128::from(self.max.div_euclid(self.count)),
        };
        i64::try_from(per_round).map_err(|_| EstimateError::DamageOverflow { policy })
    }
}

fn tally_damage(actions: &BTreeMap<String, Action>) -> Result<DamageTally, EstimateError> {
    let mut tally = DamageTally {
        max: i64::MIN,
        ..DamageTally::default()
    };

    for (name, action) in actions.iter().filter(|(_, a)| a.deals_damage()) {
        let damage = average_roll(&action.damage).map_err(|source| EstimateError::Dice {
            field: format!("action '{name}' damage"),
            source,
        })?;
        log::trace!("Action '{name}': {} -> {damage}", action.damage);
        tally.count += 1;
        tally.sum += i128::from(damage);
        tally.max = tally.max.max(damage);
    }

    if tally.count == 0 {
        return Err(EstimateError::NoDamagingActions);
    }
    Ok(tally)
}

/// Picks the value to match against the attack column: the best to-hit
/// bonus, falling back to the best save DC.
fn attack_value(actions: &BTreeMap<String, Action>) -> Result<(ExactColumn, i32), EstimateError> {
    if let Some(to_hit) = actions.values().filter_map(|a| a.to_hit).max() {
        return Ok((ExactColumn::AttackBonus, to_hit));
    }
    if let Some(save_dc) = actions.values().filter_map(|a| a.save_dc).max() {
        log::debug!("No to-hit bonus on any action; using save DC {save_dc}");
        return Ok((ExactColumn::SaveDc, save_dc));
    }
    Err(EstimateError::NoAttackBonus)
}

/// Estimates offensive CR from a monster's actions.
///
/// # Errors
///
/// Returns [`EstimateError::NoDamagingActions`] if no action carries damage,
/// [`EstimateError::NoAttackBonus`] if no action has a to-hit bonus or save
/// DC, [`EstimateError::Dice`] for a malformed damage expression,
/// [`EstimateError::DamageOverflow`] when the per-round damage does not fit
/// in an `i64` and [`EstimateError::LookupMiss`] for a miss under
/// [`LookupPolicy::Error`](crate::LookupPolicy::Error).
pub fn estimate_offensive(
    actions: &BTreeMap<String, Action>,
    table: &BalanceTable,
    config: EstimatorConfig,
) -> Result<OffensiveEstimate, EstimateError> {
    let tally = tally_damage(actions)?;
    let damage_per_round = tally.per_round(config.damage_policy)?;
    let damage_cr = range_tier(
        table,
        RangeColumn::AverageDamage,
        damage_per_round,
        config.lookup_policy,
    )?;

    let (attack_column, attack_value) = attack_value(actions)?;
    let attack_cr = exact_tier(table, attack_column, attack_value, config.lookup_policy)?;

    let cr = adjust_toward(damage_cr.value(), attack_cr.value());

    log::debug!(
        "Offensive: {} damaging action(s), {damage_per_round} damage/round ({}) (CR {damage_cr}), \
         {attack_column} {attack_value} (CR {attack_cr}) -> {cr}",
        tally.count,
        config.damage_policy
    );

    Ok(OffensiveEstimate {
        damaging_actions: usize::try_from(tally.count).unwrap_or(usize::MAX),
        damage_per_round,
        damage_cr,
        attack_column,
        attack_value,
        attack_cr,
        cr,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use monster_cr_balance::default_table;

    use super::*;
    use crate::LookupPolicy;

    fn action(damage: &str, to_hit: Option<i32>, save_dc: Option<i32>) -> Action {
        Action {
            text: String::new(),
            damage: damage.to_owned(),
            to_hit,
            save_dc,
        }
    }

    fn actions(list: &[(&str, Action)]) -> BTreeMap<String, Action> {
        list.iter()
            .map(|(name, a)| ((*name).to_owned(), a.clone()))
            .collect()
    }

    fn config(policy: DamagePolicy) -> EstimatorConfig {
        EstimatorConfig::default().with_damage_policy(policy)
    }

    #[test]
    fn fails_explicitly_without_damaging_actions() {
        let table = default_table().unwrap();
        let list = actions(&[
            ("roar", action("", None, Some(13))),
            ("glare", action("   ", Some(4), None)),
        ]);
        for policy in [
            DamagePolicy::Sum,
            DamagePolicy::Max,
            DamagePolicy::Mean,
            DamagePolicy::MaxOverCount,
        ] {
            assert!(matches!(
                estimate_offensive(&list, &table, config(policy)),
                Err(EstimateError::NoDamagingActions)
            ));
        }
        assert!(matches!(
            estimate_offensive(&BTreeMap::new(), &table, EstimatorConfig::default()),
            Err(EstimateError::NoDamagingActions)
        ));
    }

    #[test]
    fn damage_policies_aggregate_differently() {
        let table = default_table().unwrap();
        // bite 2d10+4: (6 + 24) / 2 = 15; claw 1d6+2: (3 + 8) / 2 = 5
        let list = actions(&[
            ("bite", action("2d10+4", Some(5), None)),
            ("claw", action("1d6+2", Some(5), None)),
        ]);
        let dpr = |policy| {
            estimate_offensive(&list, &table, config(policy))
                .unwrap()
                .damage_per_round
        };
        assert_eq!(dpr(DamagePolicy::Sum), 20);
        assert_eq!(dpr(DamagePolicy::Max), 15);
        assert_eq!(dpr(DamagePolicy::Mean), 10);
        assert_eq!(dpr(DamagePolicy::MaxOverCount), 7);
    }

    #[test]
    fn max_over_count_with_single_action_is_that_action() {
        let table = default_table().unwrap();
        let list = actions(&[("slam", action("2d8+3", Some(5), None))]);
        let estimate =
            estimate_offensive(&list, &table, config(DamagePolicy::MaxOverCount)).unwrap();
        // (5 + 19) / 2 = 12 -> CR 1; +5 -> CR 4
        assert_eq!(estimate.damage_per_round, 12);
        assert_eq!(estimate.damage_cr.to_string(), "1");
        assert_eq!(estimate.attack_cr.to_string(), "4");
        // 1 - trunc((1 - 4) / 2) = 1 + 1
        assert!((estimate.cr - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uses_best_to_hit_across_all_actions() {
        let table = default_table().unwrap();
        let list = actions(&[
            ("bite", action("1d6+2", Some(4), None)),
            ("tail", action("", Some(7), None)),
        ]);
        let estimate = estimate_offensive(&list, &table, EstimatorConfig::default()).unwrap();
        assert_eq!(estimate.attack_column, ExactColumn::AttackBonus);
        assert_eq!(estimate.attack_value, 7);
        assert_eq!(estimate.attack_cr.to_string(), "8");
    }

    #[test]
    fn falls_back_to_save_dc() {
        let table = default_table().unwrap();
        let list = actions(&[("breath", action("6d6", None, Some(13)))]);
        let estimate = estimate_offensive(&list, &table, EstimatorConfig::default()).unwrap();
        // 6d6: (6 + 36) / 2 = 21 -> CR 3; DC 13 -> CR 0
        assert_eq!(estimate.attack_column, ExactColumn::SaveDc);
        assert_eq!(estimate.damage_cr.to_string(), "3");
        assert_eq!(estimate.attack_cr, ChallengeRating::ZERO);
        // 3 - trunc((3 - 0) / 2) = 3 - 1
        assert!((estimate.cr - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monotonic_in_damage_for_every_attack_bonus() {
        let table = default_table().unwrap();
        let bonuses: BTreeSet<i32> = table
            .rows()
            .iter()
            .map(|row| row.attack_bonus)
            .collect();
        for bonus in bonuses {
            let mut previous = f64::NEG_INFINITY;
            for damage in 0..=350_i32 {
                // 1d1+K averages to exactly 1 + K
                let dice = format!("1d1{:+}", damage - 1);
                let list = actions(&[("strike", action(&dice, Some(bonus), None))]);
                let estimate =
                    estimate_offensive(&list, &table, EstimatorConfig::default()).unwrap();
                assert_eq!(estimate.damage_per_round, i64::from(damage));
                assert!(
                    estimate.cr >= previous,
                    "{damage} damage at +{bonus}: {} < {previous}",
                    estimate.cr
                );
                previous = estimate.cr;
            }
        }
    }

    #[test]
    fn summed_damage_out_of_range_is_an_error() {
        let table = default_table().unwrap();
        // each action averages just under i64::MAX / 2
        let huge = "4294967295d2147483647";
        let list = actions(&[
            ("a", action(huge, Some(5), None)),
            ("b", action(huge, Some(5), None)),
            ("c", action(huge, Some(5), None)),
        ]);
        assert!(matches!(
            estimate_offensive(&list, &table, config(DamagePolicy::Sum)),
            Err(EstimateError::DamageOverflow {
                policy: DamagePolicy::Sum
            })
        ));
        for policy in [
            DamagePolicy::Max,
            DamagePolicy::Mean,
            DamagePolicy::MaxOverCount,
        ] {
            let estimate = estimate_offensive(&list, &table, config(policy)).unwrap();
            assert_eq!(estimate.damage_cr, ChallengeRating::MAX);
        }
    }

    #[test]
    fn missing_attack_bonus_is_explicit() {
        let table = default_table().unwrap();
        let list = actions(&[("crush", action("2d6", None, None))]);
        assert!(matches!(
            estimate_offensive(&list, &table, EstimatorConfig::default()),
            Err(EstimateError::NoAttackBonus)
        ));
    }

    #[test]
    fn unknown_attack_bonus_honours_lookup_policy() {
        let table = default_table().unwrap();
        let list = actions(&[("bite", action("1d6+2", Some(2), None))]);
        assert!(matches!(
            estimate_offensive(&list, &table, EstimatorConfig::default()),
            Err(EstimateError::LookupMiss { .. })
        ));
        let clamped = estimate_offensive(
            &list,
            &table,
            EstimatorConfig::default().with_lookup_policy(LookupPolicy::Clamp),
        )
        .unwrap();
        assert_eq!(clamped.attack_cr, ChallengeRating::ZERO);
    }

    #[test]
    fn malformed_damage_names_the_action() {
        let table = default_table().unwrap();
        let list = actions(&[("weird", action("2d6+1d4", Some(4), None))]);
        match estimate_offensive(&list, &table, EstimatorConfig::default()) {
            Err(EstimateError::Dice { field, .. }) => assert!(field.contains("weird")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
