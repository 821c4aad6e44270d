#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `monster_cr`: scrape monster stat blocks and estimate their challenge
//! rating.
//!
//! Run without a subcommand for an interactive menu.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use monster_cr_monster::DocumentFormat;

use crate::commands::{EstimateArgs, ScrapeArgs, parse_flag};

#[derive(Parser)]
#[command(
    name = "monster_cr",
    about = "Monster stat-block scraper and challenge-rating estimator"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the challenge rating of a stat-block document
    Estimate {
        /// Stat-block document (.toml or .json)
        stat_block: PathBuf,
        #[command(flatten)]
        args: EstimateArgs,
    },
    /// Scrape every listed monster into stat-block documents
    Scrape(ScrapeArgs),
    /// Parse a saved monster detail page and print the stat block
    Parse {
        /// Saved detail page
        html_file: PathBuf,
        /// Monster name (defaults to one derived from the file name)
        #[arg(long)]
        name: Option<String>,
        /// Output format: toml or json
        #[arg(long, default_value = "toml", value_parser = parse_flag::<DocumentFormat>)]
        format: DocumentFormat,
    },
    /// Print the balancing table
    Table {
        /// Balancing table CSV (defaults to the embedded DMG table)
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = monster_cr_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Estimate { stat_block, args } => commands::estimate(&stat_block, &args)?,
        Commands::Scrape(args) => commands::scrape(&args, &multi).await?,
        Commands::Parse {
            html_file,
            name,
            format,
        } => {
            let document = commands::parse_page(&html_file, name.as_deref(), format)?;
            println!("{document}");
        }
        Commands::Table { table } => {
            let table = commands::load_balance_table(table.as_deref())?;
            print!("{}", commands::format_table(&table));
        }
    }

    Ok(())
}
