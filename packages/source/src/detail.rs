//! Monster detail page.
//!
//! The page is a series of `div.char-details-section` blocks followed by
//! trait and action sections. Most fields are a `<h5>` label with the value
//! in a sibling `<span>`; action-like sections are a `<h4>` heading followed
//! by `<p><em><strong>Name.</strong></em> <span>text</span></p>` entries.
//!
//! Every field is extracted by a named rule. Required fields that are
//! missing or malformed fail the page; optional ones are logged and left
//! empty.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use monster_cr_monster::validate_stat_block;
use monster_cr_monster_models::{Action, DefenseSet, MonsterStatBlock, Trait};
use monster_cr_scraper::{Extraction, FieldRule, element_text, extract};
use scraper::{ElementRef, Html, Selector};

use crate::SourceError;
use crate::attack::parse_action;
use crate::fields::{
    Details, entry_name, parse_ability_scores, parse_armor_class, parse_challenge_token,
    parse_conditions, parse_damage_types, parse_details, parse_hit_dice, parse_modifier,
    parse_modifiers, parse_senses, parse_speed,
};

const DETAILS: &str = "details";
const ARMOR: &str = "armor class";
const HIT_POINTS: &str = "hit points";
const SPEED: &str = "speed";
const STATS: &str = "stats";
const PROFICIENCY: &str = "proficiency bonus";
const SAVES: &str = "saving throws";
const SKILLS: &str = "skills";
const CONDITION_IMMUNITIES: &str = "condition immunities";
const DAMAGE_IMMUNITIES: &str = "damage immunities";
const DAMAGE_RESISTANCES: &str = "damage resistances";
const SENSES: &str = "senses";
const CHALLENGE: &str = "challenge";

/// Entry name of the multiattack action, which only describes other actions.
const MULTIATTACK: &str = "multiattack";

/// Name of a section entry: `<em><strong>Bite.</strong></em>`.
static ENTRY_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, em").expect("valid selector"));

fn label(name: &'static str, text: &str) -> FieldRule {
    FieldRule::labelled(name, "h5", text, "span")
}

/// The rule set for a detail page.
#[must_use]
pub fn detail_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::css(DETAILS, "div.char-details-section > em").required(),
        label(ARMOR, "Armor Class").required(),
        label(HIT_POINTS, "Hit Points").required(),
        label(SPEED, "Speed"),
        FieldRule::css(STATS, "div.char-details-section table td > div").required(),
        label(PROFICIENCY, "Proficiency Bonus").required(),
        label(SAVES, "Saving Throws"),
        label(SKILLS, "Skills"),
        label(CONDITION_IMMUNITIES, "Condition Immunities"),
        label(DAMAGE_IMMUNITIES, "Damage Immunities"),
        label(DAMAGE_RESISTANCES, "Damage Resistances"),
        label(SENSES, "Senses"),
        label(CHALLENGE, "Challenge").required(),
    ]
}

/// Parses a detail page into a validated stat block.
///
/// # Errors
///
/// Returns [`SourceError::Page`] if a required field is missing or
/// malformed, and [`SourceError::Document`] if the assembled stat block
/// fails validation.
pub fn parse_detail_page(
    html: &str,
    name: &str,
    source_url: Option<&str>,
) -> Result<MonsterStatBlock, SourceError> {
    let document = Html::parse_document(html);
    let mut fields = extract(&document, &detail_rules());

    let details = fields.parse_all(DETAILS, parse_details);
    let armor = fields.parse_first(ARMOR, parse_armor_class);
    let hitpoints = fields.parse_first(HIT_POINTS, parse_hit_dice);
    let speed = fields.parse_first(SPEED, parse_speed).unwrap_or_default();
    let stats = fields.parse_all(STATS, parse_ability_scores);
    let proficiency = fields.parse_first(PROFICIENCY, parse_modifier);
    let saves = fields.parse_first(SAVES, parse_modifiers);
    let skills = fields.parse_first(SKILLS, parse_modifiers);
    let challenge = fields.parse_first(CHALLENGE, parse_challenge_token);
    let (senses, passive_perception) = fields
        .parse_first(SENSES, parse_senses)
        .map_or((None, None), |(senses, passive)| {
            ((!senses.is_empty()).then_some(senses), passive)
        });
    let (immunities, resistances) = defenses(&fields);

    for warning in fields.warnings() {
        log::warn!("{name}: {warning}");
    }

    let (
        Some(Details {
            size,
            kind,
            alignment,
        }),
        Some(armor),
        Some(hitpoints),
        Some(stats),
        Some(proficiency),
        Some(challenge),
    ) = (details, armor, hitpoints, stats, proficiency, challenge)
    else {
        return Err(SourceError::Page {
            name: name.to_owned(),
            errors: fields.fatal_errors().cloned().collect(),
        });
    };

    let block = MonsterStatBlock {
        name: name.to_owned(),
        size,
        kind,
        alignment,
        armor,
        hitpoints,
        proficiency,
        passive_perception,
        challenge,
        source_url: source_url.map(str::to_owned),
        speed,
        stats,
        saves,
        skills,
        immunities,
        resistances,
        senses,
        abilities: traits(&document),
        actions: section(&document, "Actions")
            .into_iter()
            .filter(|(action, _)| action != MULTIATTACK)
            .collect(),
        reactions: section(&document, "Reactions"),
        legendary_actions: section(&document, "Legendary Actions"),
    };

    validate_stat_block(&block)?;
    log::debug!(
        "{name}: AC {}, {} hp, CR {}, {} action(s)",
        block.armor,
        block.hitpoints,
        block.challenge,
        block.actions.len()
    );
    Ok(block)
}

fn defenses(fields: &Extraction) -> (Option<DefenseSet>, Option<DefenseSet>) {
    let immunities = DefenseSet {
        condition: fields
            .first(CONDITION_IMMUNITIES)
            .map(parse_conditions)
            .unwrap_or_default(),
        damage: fields
            .first(DAMAGE_IMMUNITIES)
            .map(parse_damage_types)
            .unwrap_or_default(),
    };
    let resistances = DefenseSet {
        condition: BTreeSet::new(),
        damage: fields
            .first(DAMAGE_RESISTANCES)
            .map(parse_damage_types)
            .unwrap_or_default(),
    };
    (
        (!immunities.is_empty()).then_some(immunities),
        (!resistances.is_empty()).then_some(resistances),
    )
}

/// A `<p><em><strong>Name.</strong></em> <span>text</span></p>` entry.
fn entry(p: ElementRef<'_>) -> Option<(String, String)> {
    let name_el = p.select(&ENTRY_NAME_SELECTOR).next()?;
    let name = entry_name(&element_text(name_el));
    if name.is_empty() {
        return None;
    }

    let spans: Vec<String> = p
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "span")
        .map(element_text)
        .collect();
    let text = if spans.is_empty() {
        let full = element_text(p);
        let label = element_text(name_el);
        full.strip_prefix(&label).unwrap_or(&full).trim().to_owned()
    } else {
        spans.join(" ")
    };

    Some((name, text))
}

/// Passive traits: the entries of the first sections after the detail
/// blocks that have no `<h4>` heading.
fn traits(document: &Html) -> Vec<Trait> {
    let rule = FieldRule::css("traits", "div.char-details-section ~ div > p");
    let Ok(paragraphs) = rule.select(document) else {
        return Vec::new();
    };

    paragraphs
        .into_iter()
        .filter(|p| {
            p.parent()
                .and_then(ElementRef::wrap)
                .is_some_and(|div| !has_heading(div))
        })
        .filter_map(entry)
        .map(|(name, text)| Trait { name, text })
        .collect()
}

fn has_heading(div: ElementRef<'_>) -> bool {
    div.children()
        .filter_map(ElementRef::wrap)
        .any(|child| child.value().name() == "h4")
}

/// Entries under the `<h4>` heading `heading`, parsed as actions.
fn section(document: &Html, heading: &str) -> BTreeMap<String, Action> {
    let rule = FieldRule::labelled(heading, "h4", heading, "p");
    match rule.select(document) {
        Ok(paragraphs) => paragraphs
            .into_iter()
            .filter_map(entry)
            .map(|(name, text)| (name, parse_action(&text)))
            .collect(),
        Err(e) => {
            log::warn!("{e}");
            BTreeMap::new()
        }
    }
}
