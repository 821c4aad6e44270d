//! Parsers for the text of individual stat-block fields.
//!
//! Each function takes the whitespace-collapsed text of one page field and
//! returns the structured value, or a [`FieldTextError`] describing why the
//! text does not fit the expected shape.

use std::collections::{BTreeMap, BTreeSet};
use std::num::ParseIntError;
use std::sync::LazyLock;

use monster_cr_monster_models::{Ability, AbilityScores, DiceError, DiceExpression};
use regex::Regex;

/// Parenthetical remarks such as `(hover)` or `(natural armor)`.
static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("valid regex"));

/// Separator after a distance: `"30 ft., fly 60 ft."`.
static FEET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*ft\.,?\s*").expect("valid regex"));

/// `"52 (7d8 + 21)"`: average followed by the dice in parentheses.
static HIT_POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*\(([^)]*)\)").expect("valid regex"));

/// Leading integer of a field (`"15 (natural armor)"`, `"15 (+2)"`).
static LEADING_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid regex"));

/// Why a field's text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldTextError {
    /// The text does not have the expected shape.
    #[error("expected {0}")]
    Expected(&'static str),

    /// A number in the text does not parse.
    #[error("bad number: {0}")]
    Number(#[from] ParseIntError),

    /// The hit-dice expression does not parse.
    #[error(transparent)]
    Dice(#[from] DiceError),
}

fn strip_parentheticals(text: &str) -> String {
    PARENTHETICAL_RE.replace_all(text, "").into_owned()
}

/// Splits a comma-separated list, trimming and lowercasing entries and
/// dropping a leading `"and "`.
fn split_list(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(',')
        .map(str::trim)
        .map(|s| s.strip_prefix("and ").unwrap_or(s).trim())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Parses the first integer in the text (`"15 (natural armor)"` → `15`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if the text does not start with an integer.
pub fn parse_leading_int(text: &str) -> Result<i32, FieldTextError> {
    let captures = LEADING_INT_RE
        .captures(text)
        .ok_or(FieldTextError::Expected("a leading number"))?;
    Ok(captures[1].parse()?)
}

/// Parses an armor class (`"15 (natural armor)"` → `15`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if the text does not start with a
/// non-negative integer.
pub fn parse_armor_class(text: &str) -> Result<i32, FieldTextError> {
    let value = parse_leading_int(text)?;
    if value < 0 {
        return Err(FieldTextError::Expected("a non-negative armor class"));
    }
    Ok(value)
}

/// Extracts the hit-dice expression from a hit-point field
/// (`"52 (7d8 + 21)"` → `"7d8+21"`). Bare dice (`"7d8 + 21"`) are accepted.
///
/// # Errors
///
/// Returns [`FieldTextError`] if no valid dice expression is present.
pub fn parse_hit_dice(text: &str) -> Result<String, FieldTextError> {
    let dice = HIT_POINTS_RE
        .captures(text)
        .map_or(text, |c| c.get(1).map_or(text, |m| m.as_str()));
    let normalized: String = dice.split_whitespace().collect();
    normalized.parse::<DiceExpression>()?;
    Ok(normalized)
}

/// Parses movement speeds (`"30 ft., fly 60 ft. (hover)"` →
/// `{land: 30, fly: 60}`). An unnamed speed is the `land` speed.
///
/// # Errors
///
/// Returns [`FieldTextError`] if an entry is not `[mode] <feet>`.
pub fn parse_speed(text: &str) -> Result<BTreeMap<String, u32>, FieldTextError> {
    let cleaned = strip_parentheticals(text);
    let mut speeds = BTreeMap::new();

    for entry in FEET_RE.split(&cleaned).map(str::trim).filter(|s| !s.is_empty()) {
        let entry = entry.trim_start_matches(',').trim();
        let mut words: Vec<&str> = entry.split_whitespace().collect();
        let feet = words.pop().ok_or(FieldTextError::Expected("a speed"))?;
        let mode = if words.is_empty() {
            "land".to_owned()
        } else {
            words.join(" ").to_lowercase()
        };
        speeds.insert(mode, feet.parse()?);
    }

    if speeds.is_empty() {
        return Err(FieldTextError::Expected("at least one speed"));
    }
    Ok(speeds)
}

/// Parses one ability-score cell (`"15 (+2)"` → `15`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if the cell does not start with a score.
pub fn parse_ability_score(text: &str) -> Result<u8, FieldTextError> {
    let value = parse_leading_int(text)?;
    u8::try_from(value).map_err(|_| FieldTextError::Expected("an ability score"))
}

/// Parses the six ability-score cells, in `str, dex, con, int, wis, chr`
/// order.
///
/// # Errors
///
/// Returns [`FieldTextError`] unless there are exactly six parseable cells.
pub fn parse_ability_scores(cells: &[String]) -> Result<AbilityScores, FieldTextError> {
    if cells.len() != Ability::all().len() {
        return Err(FieldTextError::Expected("six ability scores"));
    }
    let mut scores = AbilityScores::default();
    for (&ability, cell) in Ability::all().iter().zip(cells) {
        scores.set(ability, parse_ability_score(cell)?);
    }
    Ok(scores)
}

/// Parses a signed modifier (`"+2"`, `"-1"`, `"3"`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if the text is not an integer.
pub fn parse_modifier(text: &str) -> Result<i32, FieldTextError> {
    Ok(text.trim().parse()?)
}

/// Parses a list of named modifiers (`"Dex +5, Sleight of Hand +6"` →
/// `{dex: 5, sleight of hand: 6}`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if an entry is not `<name> <modifier>`.
pub fn parse_modifiers(text: &str) -> Result<BTreeMap<String, i32>, FieldTextError> {
    let mut modifiers = BTreeMap::new();
    for entry in split_list(text) {
        let (name, value) = entry
            .rsplit_once(' ')
            .ok_or(FieldTextError::Expected("<name> <modifier>"))?;
        modifiers.insert(name.trim().to_owned(), parse_modifier(value)?);
    }
    Ok(modifiers)
}

/// Parses condition immunities (`"exhaustion, petrified"`).
#[must_use]
pub fn parse_conditions(text: &str) -> BTreeSet<String> {
    split_list(text).collect()
}

/// Parses damage immunities or resistances.
///
/// Segments are separated by `;`. A segment qualified by `from ...`
/// (`"bludgeoning, piercing, and slashing from nonmagical attacks"`) is kept
/// whole; any other segment is split on commas.
#[must_use]
pub fn parse_damage_types(text: &str) -> BTreeSet<String> {
    let mut types = BTreeSet::new();
    for segment in text.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        if segment.contains(" from ") {
            types.insert(segment.to_lowercase());
        } else {
            types.extend(split_list(segment));
        }
    }
    types
}

/// Parses senses (`"darkvision 60 ft., passive Perception 10"`) into the
/// sense ranges and the passive Perception score.
///
/// Entries starting with a conjunction (`"or 30 ft. while deafened"`) and
/// entries without a range are skipped.
///
/// # Errors
///
/// Returns [`FieldTextError`] if the passive Perception score is present but
/// not a number.
pub fn parse_senses(text: &str) -> Result<(BTreeMap<String, u32>, Option<u32>), FieldTextError> {
    let cleaned = strip_parentheticals(text);
    let mut senses = BTreeMap::new();
    let mut passive = None;

    for entry in FEET_RE
        .split(&cleaned)
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let lowered = entry.to_lowercase();
        if let Some(score) = lowered.strip_prefix("passive perception") {
            passive = Some(score.trim().parse()?);
            continue;
        }

        let mut words: Vec<&str> = lowered.split_whitespace().collect();
        if matches!(words.first(), Some(&"and" | &"or")) {
            log::trace!("Skipping sense qualifier '{entry}'");
            continue;
        }
        let Some(range) = words.pop().and_then(|w| w.parse::<u32>().ok()) else {
            log::debug!("Skipping sense without a range: '{entry}'");
            continue;
        };
        if words.is_empty() {
            continue;
        }
        senses.insert(words.join(" "), range);
    }

    Ok((senses, passive))
}

/// Extracts the challenge token (`"1/2 (100 XP)"` → `"1/2"`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if the text is empty.
pub fn parse_challenge_token(text: &str) -> Result<String, FieldTextError> {
    text.split_whitespace()
        .next()
        .map(str::to_owned)
        .ok_or(FieldTextError::Expected("a challenge rating"))
}

/// Size, type and alignment from the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    /// Size category, lowercased.
    pub size: String,
    /// Creature type, lowercased.
    pub kind: String,
    /// Alignment, lowercased, without the word `alignment`.
    pub alignment: String,
}

/// Parses the emphasised header items (`["Medium", "elemental", "chaotic
/// evil alignment"]`).
///
/// # Errors
///
/// Returns [`FieldTextError`] if fewer than two items are present.
pub fn parse_details(items: &[String]) -> Result<Details, FieldTextError> {
    let [size, kind, rest @ ..] = items else {
        return Err(FieldTextError::Expected("size and type"));
    };
    let alignment = rest
        .last()
        .map(|text| {
            text.split_whitespace()
                .filter(|w| !w.eq_ignore_ascii_case("alignment"))
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    Ok(Details {
        size: size.trim().to_lowercase(),
        kind: kind.trim().trim_end_matches(',').to_lowercase(),
        alignment,
    })
}

/// Normalises a section entry name (`"False Appearance."` →
/// `"false appearance"`).
#[must_use]
pub fn entry_name(text: &str) -> String {
    text.trim().trim_end_matches('.').trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armor_class_ignores_remarks() {
        assert_eq!(parse_armor_class("15 (natural armor)").unwrap(), 15);
        assert_eq!(parse_armor_class("12").unwrap(), 12);
        assert!(parse_armor_class("natural").is_err());
        assert!(matches!(
            parse_armor_class("-2 (cursed)"),
            Err(FieldTextError::Expected(_))
        ));
        assert!(parse_armor_class("99999999999").is_err());
    }

    #[test]
    fn hit_dice_are_normalised() {
        assert_eq!(parse_hit_dice("52 (7d8 + 21)").unwrap(), "7d8+21");
        assert_eq!(parse_hit_dice("7 (2d6)").unwrap(), "2d6");
        assert_eq!(parse_hit_dice("4d6 - 2").unwrap(), "4d6-2");
        assert!(matches!(parse_hit_dice("52"), Err(FieldTextError::Dice(_))));
    }

    #[test]
    fn speeds_default_to_land() {
        let speeds = parse_speed("30 ft., fly 60 ft. (hover), swim 40 ft.").unwrap();
        assert_eq!(speeds["land"], 30);
        assert_eq!(speeds["fly"], 60);
        assert_eq!(speeds["swim"], 40);
        assert_eq!(speeds.len(), 3);
        assert!(parse_speed("").is_err());
        assert!(parse_speed("fast ft.").is_err());
    }

    #[test]
    fn ability_scores_come_in_order() {
        let cells: Vec<String> = ["15 (+2)", "11 (+0)", "16 (+3)", "6 (-2)", "11 (+0)", "7 (-2)"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let scores = parse_ability_scores(&cells).unwrap();
        assert_eq!(scores.strength, 15);
        assert_eq!(scores.intelligence, 6);
        assert_eq!(scores.charisma, 7);
        assert!(parse_ability_scores(&cells[..5]).is_err());
    }

    #[test]
    fn modifiers_keep_multi_word_names() {
        let saves = parse_modifiers("Dex +5, Wis +3").unwrap();
        assert_eq!(saves["dex"], 5);
        assert_eq!(saves["wis"], 3);
        let skills = parse_modifiers("Perception +4, Sleight of Hand -1").unwrap();
        assert_eq!(skills["sleight of hand"], -1);
        assert!(parse_modifiers("Stealth").is_err());
    }

    #[test]
    fn damage_types_keep_qualified_clauses_whole() {
        let types = parse_damage_types(
            "fire, poison; bludgeoning, piercing, and slashing from nonmagical attacks",
        );
        assert!(types.contains("fire"));
        assert!(types.contains("poison"));
        assert!(types.contains("bludgeoning, piercing, and slashing from nonmagical attacks"));
        assert_eq!(types.len(), 3);

        let plain = parse_damage_types("cold, lightning, and thunder");
        assert!(plain.contains("thunder"));
        assert_eq!(plain.len(), 3);
    }

    #[test]
    fn conditions_are_lowercased() {
        let conditions = parse_conditions("Exhaustion, Petrified, Poisoned");
        assert!(conditions.contains("petrified"));
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn senses_split_out_passive_perception() {
        let (senses, passive) = parse_senses("darkvision 60 ft., passive Perception 10").unwrap();
        assert_eq!(senses["darkvision"], 60);
        assert_eq!(passive, Some(10));

        let (senses, passive) = parse_senses(
            "blindsight 10 ft. or 30 ft. while deafened (blind beyond this radius), passive Perception 13",
        )
        .unwrap();
        assert_eq!(senses.len(), 1);
        assert_eq!(senses["blindsight"], 10);
        assert_eq!(passive, Some(13));

        let (senses, passive) = parse_senses("passive Perception 9").unwrap();
        assert!(senses.is_empty());
        assert_eq!(passive, Some(9));

        assert!(parse_senses("passive Perception lots").is_err());
    }

    #[test]
    fn challenge_token_drops_experience() {
        assert_eq!(parse_challenge_token("1/2 (100 XP)").unwrap(), "1/2");
        assert_eq!(parse_challenge_token("2").unwrap(), "2");
        assert!(parse_challenge_token("  ").is_err());
    }

    #[test]
    fn details_strip_alignment_word() {
        let items: Vec<String> = ["Medium", "elemental", "chaotic evil alignment"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let details = parse_details(&items).unwrap();
        assert_eq!(details.size, "medium");
        assert_eq!(details.kind, "elemental");
        assert_eq!(details.alignment, "chaotic evil");
        assert!(parse_details(&items[..1]).is_err());
    }

    #[test]
    fn entry_names_are_normalised() {
        assert_eq!(entry_name(" False Appearance. "), "false appearance");
    }
}
