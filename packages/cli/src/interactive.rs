//! Interactive menu for `monster_cr`.
//!
//! Provides a menu-driven interface using `dialoguer` for running the
//! commands without memorizing CLI flags.

use std::path::PathBuf;

use dialoguer::{Input, Select};
use monster_cr_cli_utils::MultiProgress;
use monster_cr_estimate::{DamagePolicy, LookupPolicy};
use monster_cr_monster::DocumentFormat;
use monster_cr_source::{DEFAULT_BASE_URL, LISTING_PATH};

use crate::commands::{self, EstimateArgs, ScrapeArgs};

/// Top-level actions available in the interactive menu.
enum Tool {
    Estimate,
    Scrape,
    Parse,
    Table,
}

impl Tool {
    const ALL: &[Self] = &[Self::Estimate, Self::Scrape, Self::Parse, Self::Table];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Estimate => "Estimate a stat block's CR",
            Self::Scrape => "Scrape monsters",
            Self::Parse => "Parse a saved detail page",
            Self::Table => "Show the balancing table",
        }
    }
}

const DAMAGE_POLICIES: &[DamagePolicy] = &[
    DamagePolicy::Sum,
    DamagePolicy::Max,
    DamagePolicy::Mean,
    DamagePolicy::MaxOverCount,
];

const LOOKUP_POLICIES: &[LookupPolicy] = &[LookupPolicy::Error, LookupPolicy::Clamp];

const FORMATS: &[DocumentFormat] = &[DocumentFormat::Toml, DocumentFormat::Json];

/// Runs the interactive menu, prompting the user to select and configure
/// one command.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected command fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Estimate => {
            let stat_block: String = Input::new()
                .with_prompt("Stat block file (.toml or .json)")
                .interact_text()?;
            let args = EstimateArgs {
                table: prompt_optional_path("Balancing table CSV (empty for the DMG table)")?,
                config: prompt_optional_path("Estimator config TOML (empty for none)")?,
                damage_policy: Some(pick("Damage policy", DAMAGE_POLICIES)?),
                lookup_policy: Some(pick("Lookup policy", LOOKUP_POLICIES)?),
            };
            commands::estimate(&PathBuf::from(stat_block.trim()), &args)?;
        }
        Tool::Scrape => {
            let args = ScrapeArgs {
                base_url: Input::new()
                    .with_prompt("Site root")
                    .default(DEFAULT_BASE_URL.to_string())
                    .interact_text()?,
                listing_path: LISTING_PATH.to_owned(),
                out_dir: PathBuf::from(
                    Input::<String>::new()
                        .with_prompt("Output directory")
                        .default("monsters".to_string())
                        .interact_text()?,
                ),
                format: pick("Document format", FORMATS)?,
                limit: prompt_optional("Monster limit (empty for no limit)")?,
                delay_ms: prompt_optional("Delay between pages in ms (empty for none)")?,
                concurrency: prompt_optional("Concurrent fetches (empty for 1)")?.unwrap_or(1),
            };
            commands::scrape(&args, multi).await?;
        }
        Tool::Parse => {
            let html_file: String = Input::new()
                .with_prompt("Saved detail page (.html)")
                .interact_text()?;
            let name: String = Input::new()
                .with_prompt("Monster name (empty to use the file name)")
                .allow_empty(true)
                .interact_text()?;
            let format = pick("Document format", FORMATS)?;
            let name = name.trim();
            let document = commands::parse_page(
                &PathBuf::from(html_file.trim()),
                (!name.is_empty()).then_some(name),
                format,
            )?;
            println!("{document}");
        }
        Tool::Table => {
            let path = prompt_optional_path("Balancing table CSV (empty for the DMG table)")?;
            let table = commands::load_balance_table(path.as_deref())?;
            print!("{}", commands::format_table(&table));
        }
    }

    Ok(())
}

/// Prompts for one of `options`, labelled by their string form. The first
/// option is the default.
fn pick<T: Copy + AsRef<str>>(
    prompt: &str,
    options: &[T],
) -> Result<T, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = options.iter().map(AsRef::as_ref).collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(options[idx])
}

fn prompt_optional<T>(prompt: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.trim().parse()?))
    }
}

fn prompt_optional_path(prompt: &str) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| PathBuf::from(input)))
}
