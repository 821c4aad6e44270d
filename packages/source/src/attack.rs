//! Attack-line parsing.
//!
//! Derives the to-hit bonus, damage dice and save DC of an action from its
//! description, e.g. `"Melee Weapon Attack: +4 to hit, reach 5 ft., one
//! target. Hit: 5 (1d6 + 2) piercing damage."`.

use std::sync::LazyLock;

use monster_cr_monster_models::{Action, DiceExpression};
use regex::Regex;

static TO_HIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+-]\s*\d+)\s+to\s+hit").expect("valid regex"));

static HIT_DAMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Hit:\s*\d+\s*\(\s*(\d+\s*d\s*\d+(?:\s*[+-]\s*\d+)?)\s*\)").expect("valid regex")
});

static ANY_DAMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s*\(\s*(\d+\s*d\s*\d+(?:\s*[+-]\s*\d+)?)\s*\)").expect("valid regex")
});

static SAVE_DC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bDC\s*(\d+)").expect("valid regex"));

/// Attack bonus from `"+N to hit"`.
#[must_use]
pub fn parse_to_hit(text: &str) -> Option<i32> {
    let captures = TO_HIT_RE.captures(text)?;
    let digits: String = captures[1].split_whitespace().collect();
    digits.parse().ok()
}

/// Save DC from `"DC N"`.
#[must_use]
pub fn parse_save_dc(text: &str) -> Option<i32> {
    SAVE_DC_RE.captures(text)?[1].parse().ok()
}

/// Damage dice from the first `"Hit: X (NdM + K)"` group, normalised to
/// `NdM+K`.
///
/// Actions that force a saving throw have no `Hit:` clause; for those the
/// first `"X (NdM)"` group anywhere in the text is used.
#[must_use]
pub fn parse_damage(text: &str, has_save: bool) -> Option<String> {
    let captures = HIT_DAMAGE_RE.captures(text).or_else(|| {
        if has_save {
            ANY_DAMAGE_RE.captures(text)
        } else {
            None
        }
    })?;
    let dice: String = captures[1].split_whitespace().collect();
    dice.parse::<DiceExpression>().is_ok().then_some(dice)
}

/// Builds an [`Action`] from its description.
#[must_use]
pub fn parse_action(text: &str) -> Action {
    let to_hit = parse_to_hit(text);
    let save_dc = parse_save_dc(text);
    let damage = parse_damage(text, save_dc.is_some()).unwrap_or_default();

    Action {
        text: text.to_owned(),
        damage,
        to_hit,
        save_dc,
    }
}
