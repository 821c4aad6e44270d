//! Stat-block documents on disk.

use std::path::{Path, PathBuf};

use monster_cr_monster_models::{DiceExpression, MonsterStatBlock};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{DocumentError, InvalidReason};

/// Serialization format of a stat-block document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DocumentFormat {
    /// TOML document (`.toml`).
    #[default]
    Toml,
    /// JSON document (`.json`).
    Json,
}

impl DocumentFormat {
    /// Detects the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] if the extension is
    /// missing or not `toml`/`json`.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
            .map_err(|_| DocumentError::UnsupportedFormat(path.display().to_string()))
    }

    /// File extension for this format, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Parses and validates a stat block from document text.
///
/// # Errors
///
/// Returns [`DocumentError`] if the text is not valid for `format` or the
/// stat block fails validation.
pub fn parse_stat_block(
    text: &str,
    format: DocumentFormat,
) -> Result<MonsterStatBlock, DocumentError> {
    let block: MonsterStatBlock = match format {
        DocumentFormat::Toml => toml::from_str(text)?,
        DocumentFormat::Json => serde_json::from_str(text)?,
    };
    validate_stat_block(&block)?;
    Ok(block)
}

/// Renders a stat block as document text.
///
/// # Errors
///
/// Returns [`DocumentError`] if serialization fails.
pub fn render_stat_block(
    block: &MonsterStatBlock,
    format: DocumentFormat,
) -> Result<String, DocumentError> {
    Ok(match format {
        DocumentFormat::Toml => toml::to_string_pretty(block)?,
        DocumentFormat::Json => serde_json::to_string_pretty(block)?,
    })
}

/// Reads, parses and validates the stat block at `path`.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if the file cannot be read, and the errors
/// of [`parse_stat_block`] otherwise.
pub fn load_stat_block(path: &Path) -> Result<MonsterStatBlock, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    let block = parse_stat_block(&text, format)?;
    log::debug!("Loaded stat block '{}' from {}", block.name, path.display());
    Ok(block)
}

/// Writes `block` into `dir` as `<slug>.<ext>` and returns the written path.
///
/// The directory is created if it does not exist.
///
/// # Errors
///
/// Returns [`DocumentError`] if serialization or the write fails.
pub fn save_stat_block(
    block: &MonsterStatBlock,
    dir: &Path,
    format: DocumentFormat,
) -> Result<PathBuf, DocumentError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", slugify(&block.name), format.extension()));
    let text = render_stat_block(block, format)?;
    std::fs::write(&path, text)?;
    log::debug!("Wrote stat block '{}' to {}", block.name, path.display());
    Ok(path)
}

/// Turns a monster name into a file stem: lowercase ASCII alphanumerics
/// separated by single underscores.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("monster");
    }
    slug
}

/// Checks ability scores, armor class, hit dice, challenge token and action
/// damage.
///
/// # Errors
///
/// Returns [`DocumentError::Invalid`] naming the first failing field.
pub fn validate_stat_block(block: &MonsterStatBlock) -> Result<(), DocumentError> {
    let invalid = |reason: InvalidReason| DocumentError::Invalid {
        name: block.name.clone(),
        reason,
    };

    if let Some((ability, score)) = block.stats.out_of_range() {
        return Err(invalid(InvalidReason::AbilityScore { ability, score }));
    }

    if block.armor < 0 {
        return Err(invalid(InvalidReason::ArmorClass(block.armor)));
    }

    block
        .hitpoints
        .parse::<DiceExpression>()
        .map_err(|e| invalid(e.into()))?;

    block.challenge_value().map_err(|e| invalid(e.into()))?;

    for (name, action) in block
        .actions
        .iter()
        .chain(&block.reactions)
        .chain(&block.legendary_actions)
        .filter(|(_, action)| action.deals_damage())
    {
        action.damage.parse::<DiceExpression>().map_err(|source| {
            invalid(InvalidReason::ActionDamage {
                action: name.clone(),
                source,
            })
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use monster_cr_monster_models::Ability;

    use super::*;

    const GARGOYLE: &str = include_str!("../fixtures/gargoyle.toml");

    #[test]
    fn parses_gargoyle_fixture() {
        let block = parse_stat_block(GARGOYLE, DocumentFormat::Toml).unwrap();
        assert_eq!(block.name, "Gargoyle");
        assert_eq!(block.kind, "elemental");
        assert_eq!(block.armor, 15);
        assert_eq!(block.hitpoints, "7d8+21");
        assert_eq!(block.speed["fly"], 60);
        assert_eq!(block.stats.charisma, 7);
        assert_eq!(block.passive_perception, Some(10));
        let immunities = block.immunities.as_ref().unwrap();
        assert!(immunities.condition.contains("petrified"));
        assert!(immunities.damage.contains("poison"));
        assert_eq!(block.abilities.len(), 1);
        assert_eq!(block.actions.len(), 2);
        assert_eq!(block.actions["claws"].to_hit, Some(4));
    }

    #[test]
    fn toml_and_json_renderings_agree() {
        let block = parse_stat_block(GARGOYLE, DocumentFormat::Toml).unwrap();
        let json = render_stat_block(&block, DocumentFormat::Json).unwrap();
        let from_json = parse_stat_block(&json, DocumentFormat::Json).unwrap();
        let toml = render_stat_block(&from_json, DocumentFormat::Toml).unwrap();
        let from_toml = parse_stat_block(&toml, DocumentFormat::Toml).unwrap();
        assert_eq!(block, from_toml);
    }

    #[test]
    fn rejects_out_of_range_ability_score() {
        let text = GARGOYLE.replace("str = 15", "str = 31");
        let err = parse_stat_block(&text, DocumentFormat::Toml).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Invalid {
                reason: InvalidReason::AbilityScore {
                    ability: Ability::Strength,
                    score: 31
                },
                ..
            }
        ));
    }

    #[test]
    fn rejects_missing_ability_key() {
        let text = GARGOYLE.replace("wis = 11\n", "");
        assert!(matches!(
            parse_stat_block(&text, DocumentFormat::Toml),
            Err(DocumentError::TomlParse(_))
        ));
    }

    #[test]
    fn rejects_armor_class_outside_integer_range() {
        let text = GARGOYLE.replace("armor = 15", "armor = -1");
        let err = parse_stat_block(&text, DocumentFormat::Toml).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Invalid {
                reason: InvalidReason::ArmorClass(-1),
                ..
            }
        ));

        let text = GARGOYLE.replace("armor = 15", "armor = 4294967296");
        assert!(matches!(
            parse_stat_block(&text, DocumentFormat::Toml),
            Err(DocumentError::TomlParse(_))
        ));
    }

    #[test]
    fn rejects_bad_hit_dice() {
        let text = GARGOYLE.replace("hitpoints = \"7d8+21\"", "hitpoints = \"52\"");
        let err = parse_stat_block(&text, DocumentFormat::Toml).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Invalid {
                reason: InvalidReason::HitDice(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_challenge() {
        let text = GARGOYLE.replace("challenge = \"2\"", "challenge = \"two\"");
        let err = parse_stat_block(&text, DocumentFormat::Toml).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Invalid {
                reason: InvalidReason::Challenge(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_action_damage() {
        let text = GARGOYLE.replacen("damage = \"1d6+2\"", "damage = \"1d6+1d4\"", 1);
        let err = parse_stat_block(&text, DocumentFormat::Toml).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Invalid {
                reason: InvalidReason::ActionDamage { .. },
                ..
            }
        ));
    }

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/gargoyle.toml")).unwrap(),
            DocumentFormat::Toml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("gargoyle.JSON")).unwrap(),
            DocumentFormat::Json
        );
        assert!(matches!(
            DocumentFormat::from_path(Path::new("gargoyle.yaml")),
            Err(DocumentError::UnsupportedFormat(_))
        ));
        assert!(DocumentFormat::from_path(Path::new("gargoyle")).is_err());
    }

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("Adult Red Dragon"), "adult_red_dragon");
        assert_eq!(slugify("Will-o'-Wisp"), "will_o_wisp");
        assert_eq!(slugify("  Giant  Rat (Diseased) "), "giant_rat_diseased");
        assert_eq!(slugify("???"), "monster");
    }

    #[test]
    fn saves_and_loads_from_disk() {
        let block = parse_stat_block(GARGOYLE, DocumentFormat::Toml).unwrap();
        let dir = std::env::temp_dir().join(format!("monster_cr_doc_test_{}", std::process::id()));
        let path = save_stat_block(&block, &dir, DocumentFormat::Json).unwrap();
        assert_eq!(path.file_name().unwrap(), "gargoyle.json");
        let loaded = load_stat_block(&path).unwrap();
        assert_eq!(loaded, block);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_stat_block(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }
}
