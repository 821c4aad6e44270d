//! The work behind each `monster_cr` command, shared by the flag-driven and
//! interactive front ends.

use std::fmt::{Display, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use clap::Args;
use monster_cr_balance::{BalanceTable, TableError, default_table, load_table};
use monster_cr_balance_models::ExactColumn;
use monster_cr_cli_utils::{IndicatifProgress, MultiProgress};
use monster_cr_estimate::{
    ConfigError, CrEstimate, DamagePolicy, EstimatorConfig, LookupPolicy, OffensiveEstimate,
    estimate_challenge,
};
use monster_cr_monster::{DocumentFormat, load_stat_block, render_stat_block};
use monster_cr_monster_models::MonsterStatBlock;
use monster_cr_scraper::ScrapeConfig;
use monster_cr_source::{DEFAULT_BASE_URL, LISTING_PATH, ScrapeOptions, scrape_monsters};

/// Parses a flag value through its `FromStr` impl.
///
/// # Errors
///
/// Returns the parse failure as a message clap can print.
pub fn parse_flag<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e| format!("'{value}': {e}"))
}

/// Balancing-table and estimator settings.
#[derive(Args, Debug, Clone, Default)]
pub struct EstimateArgs {
    /// Balancing table CSV (defaults to the embedded DMG table)
    #[arg(long)]
    pub table: Option<PathBuf>,
    /// Estimator config TOML
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Per-round damage policy: sum, max, mean or max-over-count
    #[arg(long, value_parser = parse_flag::<DamagePolicy>)]
    pub damage_policy: Option<DamagePolicy>,
    /// Behaviour when no table row matches: error or clamp
    #[arg(long, value_parser = parse_flag::<LookupPolicy>)]
    pub lookup_policy: Option<LookupPolicy>,
}

impl EstimateArgs {
    /// The config file (if any) with the policy flags applied on top.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be loaded.
    pub fn estimator_config(&self) -> Result<EstimatorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => EstimatorConfig::load(path)?,
            None => EstimatorConfig::default(),
        };
        if let Some(policy) = self.damage_policy {
            config = config.with_damage_policy(policy);
        }
        if let Some(policy) = self.lookup_policy {
            config = config.with_lookup_policy(policy);
        }
        Ok(config)
    }
}

/// Scrape target and pacing.
#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Site root
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Listing page path relative to the site root
    #[arg(long, default_value = LISTING_PATH)]
    pub listing_path: String,
    /// Directory the stat-block documents are written to
    #[arg(long, default_value = "monsters")]
    pub out_dir: PathBuf,
    /// Document format: toml or json
    #[arg(long, default_value = "toml", value_parser = parse_flag::<DocumentFormat>)]
    pub format: DocumentFormat,
    /// Maximum number of monsters to scrape
    #[arg(long)]
    pub limit: Option<usize>,
    /// Pause before each detail-page fetch, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Detail pages fetched at once
    #[arg(long, default_value = "1")]
    pub concurrency: usize,
}

impl ScrapeArgs {
    /// Converts the flags into scrape-loop options.
    #[must_use]
    pub fn options(&self) -> ScrapeOptions {
        let mut config = ScrapeConfig::new(&self.base_url).with_concurrency(self.concurrency);
        if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }
        if let Some(ms) = self.delay_ms {
            config = config.with_delay_ms(ms);
        }
        ScrapeOptions::new(config, self.out_dir.clone())
            .with_listing_path(&self.listing_path)
            .with_format(self.format)
    }
}

/// Loads the table at `path`, or the embedded table when `None`.
///
/// # Errors
///
/// Returns [`TableError`] if the table cannot be read or parsed.
pub fn load_balance_table(path: Option<&Path>) -> Result<BalanceTable, TableError> {
    path.map_or_else(default_table, load_table)
}

/// Estimates and prints the CR of the stat block at `stat_block`.
///
/// # Errors
///
/// Returns an error if the stat block, table or config cannot be loaded, or
/// if estimation fails.
pub fn estimate(stat_block: &Path, args: &EstimateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let block = load_stat_block(stat_block)?;
    let table = load_balance_table(args.table.as_deref())?;
    let config = args.estimator_config()?;
    log::debug!("Estimating with {config:?}");

    let estimate = estimate_challenge(&block, &table, config)?;
    print!("{}", format_estimate(&block, &estimate));
    Ok(())
}

fn attack_label(offensive: &OffensiveEstimate) -> String {
    match offensive.attack_column {
        ExactColumn::SaveDc => format!("save DC {}", offensive.attack_value),
        _ => format!("{:+} to hit", offensive.attack_value),
    }
}

/// Renders an estimate as a console report.
#[must_use]
pub fn format_estimate(block: &MonsterStatBlock, estimate: &CrEstimate) -> String {
    let defensive = &estimate.defensive;
    let offensive = &estimate.offensive;

    let mut out = String::new();
    let _ = writeln!(out, "{} (listed CR {})", block.name, block.challenge);
    let _ = writeln!(
        out,
        "  Defensive CR: {} ({} hp -> CR {}, AC {} -> CR {})",
        defensive.cr,
        defensive.expected_hitpoints,
        defensive.hitpoints_cr,
        block.armor,
        defensive.armor_class_cr
    );
    let _ = writeln!(
        out,
        "  Offensive CR: {} ({} damage/round from {} action(s) -> CR {}, {} -> CR {})",
        offensive.cr,
        offensive.damage_per_round,
        offensive.damaging_actions,
        offensive.damage_cr,
        attack_label(offensive),
        offensive.attack_cr
    );
    let _ = writeln!(
        out,
        "  Raw CR:       {} (floored {})",
        estimate.mean, estimate.floored
    );
    let _ = writeln!(out, "  Estimated CR: {}", estimate.rating);
    out
}

/// Scrapes every monster into `args.out_dir`, reporting on a progress bar.
///
/// # Errors
///
/// Returns an error if the listing page cannot be fetched or parsed.
pub async fn scrape(
    args: &ScrapeArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = args.options();
    let progress = IndicatifProgress::pages_bar(multi, "Fetching monster listing...");

    let start = Instant::now();
    let summary = scrape_monsters(&options, progress).await?;
    log::info!(
        "Wrote {} of {} listed monsters to {} in {:.1}s",
        summary.written.len(),
        summary.listed,
        options.out_dir.display(),
        start.elapsed().as_secs_f64()
    );
    for failed in &summary.failed {
        log::warn!("Skipped {} ({}): {}", failed.name, failed.url, failed.error);
    }
    Ok(())
}

/// Monster name for a saved page: the file stem with `_`/`-` as spaces and
/// each word capitalised.
fn page_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a saved detail page and renders the stat block as a document.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the page does not parse or
/// the stat block cannot be rendered.
pub fn parse_page(
    html_file: &Path,
    name: Option<&str>,
    format: DocumentFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let html = std::fs::read_to_string(html_file)?;
    let name = name.map_or_else(|| page_name(html_file), str::to_owned);
    let block = monster_cr_source::parse_detail_page(&html, &name, None)?;
    Ok(render_stat_block(&block, format)?)
}

/// Renders the balancing table as aligned columns.
#[must_use]
pub fn format_table(table: &BalanceTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:>9}  {:>3}  {:>7}  {:>4}  {:>6}  {:>4}",
        "CR", "HP", "AC", "Damage", "Prof", "Attack", "DC"
    );
    for row in table.rows() {
        let _ = writeln!(
            out,
            "{:>4}  {:>9}  {:>3}  {:>7}  {:>+4}  {:>+6}  {:>4}",
            row.cr.to_string(),
            row.hitpoints.to_string(),
            row.armor_class,
            row.average_damage.to_string(),
            row.proficiency_bonus,
            row.attack_bonus,
            row.save_dc
        );
    }
    out
}
