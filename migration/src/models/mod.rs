//! Domain models for the migration pipeline.
//!
//! - [`LocaleRow`] - One geographic unit with its population and inflows
//! - [`CleanTable`] - The normalized, rectangular migration table

use std::fmt;
use std::io::Write;

use crate::error::{ProjectionError, ProjectionResult};

/// Column heading of the locale names
pub const LOCALE_COLUMN: &str = "Locale";
/// Column heading of the total population
pub const TOTAL_COLUMN: &str = "Total";
/// Column heading of the people who did not change state
pub const STAYED_COLUMN: &str = "Stayed";

// =============================================================================
// Locale Row
// =============================================================================

/// One locale (the nation aggregate or a state) of the clean table.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleRow {
    pub name: String,
    /// Population one year and over
    pub total: i64,
    /// Same house plus same state, different house
    pub stayed: i64,
    /// People who moved into this locale, one count per state column
    pub inflows: Vec<i64>,
}

// =============================================================================
// Clean Table
// =============================================================================

/// The normalized migration table.
///
/// Row 0 is the nation aggregate; the other rows are states in the same
/// order as [`CleanTable::states`], which names the inflow columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    states: Vec<String>,
    rows: Vec<LocaleRow>,
}

impl CleanTable {
    /// Assemble a table. Inflow vectors must be as long as `states`.
    pub fn new(states: Vec<String>, rows: Vec<LocaleRow>) -> ProjectionResult<Self> {
        for row in &rows {
            if row.inflows.len() != states.len() {
                return Err(ProjectionError::DimensionMismatch {
                    expected: states.len(),
                    actual: row.inflows.len(),
                });
            }
        }
        Ok(Self { states, rows })
    }

    /// `Locale`, `Total`, `Stayed`, then the state columns
    pub fn headers(&self) -> Vec<String> {
        [LOCALE_COLUMN, TOTAL_COLUMN, STAYED_COLUMN]
            .iter()
            .map(|h| h.to_string())
            .chain(self.states.iter().cloned())
            .collect()
    }

    /// Names of the inflow columns
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn rows(&self) -> &[LocaleRow] {
        &self.rows
    }

    /// The nation aggregate (row 0)
    pub fn nation(&self) -> Option<&LocaleRow> {
        self.rows.first()
    }

    /// Every row after the nation aggregate
    pub fn state_rows(&self) -> &[LocaleRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn row(&self, name: &str) -> Option<&LocaleRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Count of people who moved from `origin` into `destination`.
    pub fn inflow(&self, destination: &str, origin: &str) -> Option<i64> {
        let col = self.states.iter().position(|s| s == origin)?;
        self.row(destination).map(|r| r.inflows[col])
    }

    /// (rows, columns) including the three leading columns
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.states.len() + 3)
    }

    /// Keep the nation row and the named states, as both rows and
    /// columns, in table order.
    pub fn subset(&self, states: &[&str]) -> ProjectionResult<Self> {
        for name in states {
            if !self.states.iter().any(|s| s == name) {
                return Err(ProjectionError::UnknownLocale(name.to_string()));
            }
        }

        let columns: Vec<usize> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, s)| states.contains(&s.as_str()))
            .map(|(i, _)| i)
            .collect();

        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, row)| *i == 0 || states.contains(&row.name.as_str()))
            .map(|(_, row)| LocaleRow {
                name: row.name.clone(),
                total: row.total,
                stayed: row.stayed,
                inflows: columns.iter().map(|&c| row.inflows[c]).collect(),
            })
            .collect();

        Ok(Self {
            states: columns.iter().map(|&c| self.states[c].clone()).collect(),
            rows,
        })
    }

    /// Write the table as CSV with a heading row.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.headers())?;
        for row in &self.rows {
            let mut record = vec![row.name.clone(), row.total.to_string(), row.stayed.to_string()];
            record.extend(row.inflows.iter().map(|v| v.to_string()));
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for CleanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(LOCALE_COLUMN.len());
        write!(f, "{:<width$} {:>10} {:>10}", LOCALE_COLUMN, TOTAL_COLUMN, STAYED_COLUMN, width = width)?;
        for state in &self.states {
            write!(f, " {:>10}", state)?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:<width$} {:>10} {:>10}", row.name, row.total, row.stayed, width = width)?;
            for value in &row.inflows {
                write!(f, " {:>10}", value)?;
            }
            writeln!(f)?;
        }
        write!(f, "[{} rows x {} columns]", self.shape().0, self.shape().1)
    }
}
