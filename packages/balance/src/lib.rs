#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Monster balancing-table loading and tier lookups.
//!
//! The table is a CSV with one row per challenge-rating tier. Range cells
//! use `low-high` with `*` for an unbounded upper end. The Dungeon Master's
//! Guide table is embedded at compile time and returned by
//! [`default_table`].

pub mod lookup;

use std::io::Read;
use std::path::Path;

use monster_cr_balance_models::{BalanceRow, RangeParseError, StatRange};
use monster_cr_monster_models::ChallengeParseError;
use serde::Deserialize;

/// The DMG "Monster Statistics by Challenge Rating" table.
const DEFAULT_TABLE_CSV: &str = include_str!("../data/monster_balancing_table.csv");

/// Errors that can occur while loading a balancing table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Reading the table file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV structure is invalid (missing column, ragged row, ...).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A cell could not be parsed.
    #[error("Parse error in row {row}, column '{column}': {message}")]
    Parse {
        /// One-based data row number (the header is row 0).
        row: usize,
        /// Column name.
        column: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The table has no data rows.
    #[error("balancing table has no rows")]
    Empty,
}

/// A balancing table: tiers in ascending challenge-rating order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceTable {
    rows: Vec<BalanceRow>,
}

impl BalanceTable {
    /// Builds a table from rows, which must be non-empty.
    ///
    /// Rows out of ascending CR order are accepted but logged; lookups are
    /// first-match in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Empty`] if `rows` is empty.
    pub fn from_rows(rows: Vec<BalanceRow>) -> Result<Self, TableError> {
        if rows.is_empty() {
            return Err(TableError::Empty);
        }
        if let Some(pair) = rows.windows(2).find(|w| w[0].cr >= w[1].cr) {
            log::warn!(
                "Balancing table rows are not in ascending CR order (CR {} followed by CR {})",
                pair[0].cr,
                pair[1].cr
            );
        }
        Ok(Self { rows })
    }

    /// Returns the rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[BalanceRow] {
        &self.rows
    }

    /// Returns the number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`: tables are non-empty by construction.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Raw CSV row before cell parsing.
#[derive(Debug, Deserialize)]
struct RawRow {
    cr: String,
    hitpoints: String,
    armor_class: String,
    average_damage: String,
    proficiency_bonus: String,
    attack_bonus: String,
    save_dc: String,
}

impl RawRow {
    fn parse(&self, row: usize) -> Result<BalanceRow, TableError> {
        let cell_error = |column: &'static str, message: String| TableError::Parse {
            row,
            column,
            message,
        };
        let int = |column: &'static str, cell: &str| -> Result<i32, TableError> {
            cell.trim()
                .parse()
                .map_err(|e| cell_error(column, format!("'{cell}': {e}")))
        };
        let range = |column: &'static str, cell: &str| -> Result<StatRange, TableError> {
            cell.parse()
                .map_err(|e: RangeParseError| cell_error(column, e.to_string()))
        };

        Ok(BalanceRow {
            cr: self
                .cr
                .parse()
                .map_err(|e: ChallengeParseError| cell_error("cr", e.to_string()))?,
            hitpoints: range("hitpoints", &self.hitpoints)?,
            armor_class: int("armor_class", &self.armor_class)?,
            average_damage: range("average_damage", &self.average_damage)?,
            proficiency_bonus: int("proficiency_bonus", &self.proficiency_bonus)?,
            attack_bonus: int("attack_bonus", &self.attack_bonus)?,
            save_dc: int("save_dc", &self.save_dc)?,
        })
    }
}

/// Parses a balancing table from CSV. The header row names the columns;
/// column order is free and extra columns are ignored.
///
/// # Errors
///
/// Returns [`TableError`] if the CSV is malformed, a cell does not parse or
/// the table is empty.
pub fn parse_table<R: Read>(reader: R) -> Result<BalanceTable, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        rows.push(record?.parse(i + 1)?);
    }

    log::debug!("Parsed {} balancing-table rows", rows.len());
    BalanceTable::from_rows(rows)
}

/// Loads a balancing table from a CSV file.
///
/// # Errors
///
/// Returns [`TableError::Io`] if the file cannot be opened and the errors of
/// [`parse_table`] otherwise.
pub fn load_table(path: &Path) -> Result<BalanceTable, TableError> {
    let file = std::fs::File::open(path)?;
    let table = parse_table(file)?;
    log::info!(
        "Loaded balancing table with {} tiers from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// Returns the embedded DMG balancing table.
///
/// # Errors
///
/// Returns [`TableError`] only if the embedded CSV is corrupt.
pub fn default_table() -> Result<BalanceTable, TableError> {
    parse_table(DEFAULT_TABLE_CSV.as_bytes())
}
