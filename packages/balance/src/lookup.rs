//! Tier lookups.
//!
//! All lookups are first-match in table order, so when several tiers share a
//! value (armor class 13 spans CR 0 through 3) the lowest tier wins. The
//! `nearest_*` variants never miss on a non-empty table: they fall back to
//! the tier closest to the queried value.

use monster_cr_balance_models::{BalanceRow, ExactColumn, RangeColumn};

use crate::BalanceTable;

impl BalanceTable {
    /// Returns the first row whose `column` range contains `value`.
    #[must_use]
    pub fn first_in_range(&self, column: RangeColumn, value: i64) -> Option<&BalanceRow> {
        self.rows().iter().find(|row| row.range(column).contains(value))
    }

    /// Returns the first row whose `column` equals `value`.
    #[must_use]
    pub fn first_exact(&self, column: ExactColumn, value: i32) -> Option<&BalanceRow> {
        self.rows().iter().find(|row| row.exact(column) == value)
    }

    /// Like [`first_in_range`](Self::first_in_range), but falls back to the
    /// row whose range is closest to `value`.
    #[must_use]
    pub fn nearest_in_range(&self, column: RangeColumn, value: i64) -> &BalanceRow {
        self.first_in_range(column, value).unwrap_or_else(|| {
            closest(self.rows(), |row| row.range(column).distance(value))
        })
    }

    /// Like [`first_exact`](Self::first_exact), but falls back to the row
    /// whose value is closest to `value`.
    #[must_use]
    pub fn nearest_exact(&self, column: ExactColumn, value: i32) -> &BalanceRow {
        self.first_exact(column, value).unwrap_or_else(|| {
            closest(self.rows(), |row| row.exact(column).abs_diff(value).into())
        })
    }

    /// Convenience for [`first_in_range`](Self::first_in_range) on hit points.
    #[must_use]
    pub fn first_containing_hitpoints(&self, hitpoints: i64) -> Option<&BalanceRow> {
        self.first_in_range(RangeColumn::Hitpoints, hitpoints)
    }

    /// Convenience for [`first_in_range`](Self::first_in_range) on average
    /// damage.
    #[must_use]
    pub fn first_containing_damage(&self, damage: i64) -> Option<&BalanceRow> {
        self.first_in_range(RangeColumn::AverageDamage, damage)
    }

    /// Convenience for [`first_exact`](Self::first_exact) on armor class.
    #[must_use]
    pub fn first_with_armor_class(&self, armor_class: i32) -> Option<&BalanceRow> {
        self.first_exact(ExactColumn::ArmorClass, armor_class)
    }

    /// Convenience for [`first_exact`](Self::first_exact) on attack bonus.
    #[must_use]
    pub fn first_with_attack_bonus(&self, attack_bonus: i32) -> Option<&BalanceRow> {
        self.first_exact(ExactColumn::AttackBonus, attack_bonus)
    }

    /// Convenience for [`first_exact`](Self::first_exact) on save DC.
    #[must_use]
    pub fn first_with_save_dc(&self, save_dc: i32) -> Option<&BalanceRow> {
        self.first_exact(ExactColumn::SaveDc, save_dc)
    }
}

/// Returns the first row with the smallest `distance`.
fn closest(rows: &[BalanceRow], distance: impl Fn(&BalanceRow) -> u64) -> &BalanceRow {
    let mut best = &rows[0];
    let mut best_distance = distance(best);
    for row in &rows[1..] {
        let d = distance(row);
        if d < best_distance {
            best = row;
            best_distance = d;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use monster_cr_balance_models::StatRange;
    use monster_cr_monster_models::ChallengeRating;

    use super::*;
    use crate::default_table;

    fn cr(token: &str) -> ChallengeRating {
        token.parse().unwrap()
    }

    fn row(token: &str, hp: (i64, i64), ac: i32, attack: i32) -> BalanceRow {
        BalanceRow {
            cr: cr(token),
            hitpoints: StatRange::new(hp.0, hp.1),
            armor_class: ac,
            average_damage: StatRange::new(0, 10),
            proficiency_bonus: 2,
            attack_bonus: attack,
            save_dc: 13,
        }
    }

    #[test]
    fn finds_hitpoint_tier_inclusively() {
        let table = default_table().unwrap();
        assert_eq!(table.first_containing_hitpoints(50).unwrap().cr, cr("1/2"));
        assert_eq!(table.first_containing_hitpoints(70).unwrap().cr, cr("1/2"));
        assert_eq!(table.first_containing_hitpoints(71).unwrap().cr, cr("1"));
        assert_eq!(
            table.first_containing_hitpoints(5_000).unwrap().cr,
            ChallengeRating::MAX
        );
    }

    #[test]
    fn hitpoint_miss_returns_none() {
        let table = default_table().unwrap();
        assert!(table.first_containing_hitpoints(0).is_none());
    }

    #[test]
    fn exact_armor_class_prefers_lowest_tier() {
        let table = default_table().unwrap();
        assert_eq!(table.first_with_armor_class(13).unwrap().cr, ChallengeRating::ZERO);
        assert_eq!(table.first_with_armor_class(15).unwrap().cr, cr("5"));
        assert!(table.first_with_armor_class(12).is_none());
    }

    #[test]
    fn duplicate_values_resolve_to_first_row() {
        let table = BalanceTable::from_rows(vec![
            row("1", (1, 10), 14, 4),
            row("2", (11, 20), 14, 4),
            row("3", (21, 30), 15, 5),
        ])
        .unwrap();
        assert_eq!(table.first_with_armor_class(14).unwrap().cr, cr("1"));
        assert_eq!(table.first_with_attack_bonus(4).unwrap().cr, cr("1"));
    }

    #[test]
    fn nearest_range_clamps_below_and_into_gaps() {
        let table = BalanceTable::from_rows(vec![
            row("1", (10, 20), 13, 3),
            row("2", (30, 40), 14, 4),
        ])
        .unwrap();
        assert_eq!(table.nearest_in_range(RangeColumn::Hitpoints, 1).cr, cr("1"));
        assert_eq!(table.nearest_in_range(RangeColumn::Hitpoints, 24).cr, cr("1"));
        assert_eq!(table.nearest_in_range(RangeColumn::Hitpoints, 26).cr, cr("2"));
        // equidistant: first row wins
        assert_eq!(table.nearest_in_range(RangeColumn::Hitpoints, 25).cr, cr("1"));
        assert_eq!(table.nearest_in_range(RangeColumn::Hitpoints, 99).cr, cr("2"));
    }

    #[test]
    fn nearest_exact_clamps_to_closest_value() {
        let table = default_table().unwrap();
        assert_eq!(
            table.nearest_exact(ExactColumn::ArmorClass, 12).cr,
            ChallengeRating::ZERO
        );
        assert_eq!(
            table.nearest_exact(ExactColumn::ArmorClass, 25).cr,
            cr("17")
        );
        assert_eq!(table.nearest_exact(ExactColumn::AttackBonus, 6).cr, cr("5"));
    }

    #[test]
    fn save_dc_lookup() {
        let table = default_table().unwrap();
        assert_eq!(table.first_with_save_dc(16).unwrap().cr, cr("8"));
        assert!(table.first_with_save_dc(30).is_none());
    }
}
