//! Transition matrix and population vector.
//!
//! Entry `(destination, origin)` of a [`TransitionMatrix`] is the fraction
//! of the origin's population that moved to the destination; the diagonal
//! is the fraction that stayed.

use nalgebra::{DMatrix, DVector};
use std::fmt;

use crate::error::{ProjectionError, ProjectionResult};
use crate::logs::{log_info, log_warning};
use crate::models::CleanTable;

/// Label of the synthesized state holding every unmodeled locale
pub const OTHER_LOCALE: &str = "Other";

/// Column sums further than this below 1 mean the system is open
const CLOSED_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Transition Matrix
// =============================================================================

/// Square matrix of migration fractions between labelled locales.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    labels: Vec<String>,
    matrix: DMatrix<f64>,
}

impl TransitionMatrix {
    /// Wrap a matrix; it must be square with one label per row.
    pub fn new(labels: Vec<String>, matrix: DMatrix<f64>) -> ProjectionResult<Self> {
        if !matrix.is_square() {
            return Err(ProjectionError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        if labels.len() != matrix.nrows() {
            return Err(ProjectionError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: labels.len(),
            });
        }
        Ok(Self { labels, matrix })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Number of locales (rows = columns)
    pub fn dim(&self) -> usize {
        self.labels.len()
    }

    /// Fraction of `origin` that moved to `destination`
    pub fn get(&self, destination: &str, origin: &str) -> Option<f64> {
        let d = self.labels.iter().position(|l| l == destination)?;
        let o = self.labels.iter().position(|l| l == origin)?;
        Some(self.matrix[(d, o)])
    }

    pub fn column_sums(&self) -> Vec<f64> {
        self.matrix.column_iter().map(|c| c.sum()).collect()
    }

    /// Every column sums to 1 within `tolerance`
    pub fn is_column_stochastic(&self, tolerance: f64) -> bool {
        self.column_sums().iter().all(|s| (s - 1.0).abs() <= tolerance)
    }
}

impl fmt::Display for TransitionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels.iter().map(String::len).max().unwrap_or(0);
        let cell = width.max(6);
        write!(f, "{:width$}", "", width = width)?;
        for label in &self.labels {
            write!(f, " {:>cell$}", label, cell = cell)?;
        }
        for (r, label) in self.labels.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{:<width$}", label, width = width)?;
            for value in self.matrix.row(r).iter() {
                write!(f, " {:>cell$.3}", value, cell = cell)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Population Vector
// =============================================================================

/// Population per locale, aligned with a transition matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationVector {
    labels: Vec<String>,
    values: DVector<f64>,
}

impl PopulationVector {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> ProjectionResult<Self> {
        if labels.len() != values.len() {
            return Err(ProjectionError::DimensionMismatch {
                expected: labels.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            labels,
            values: DVector::from_vec(values),
        })
    }

    /// The Total column of every state row (nation excluded).
    pub fn from_table(table: &CleanTable) -> Self {
        let rows = table.state_rows();
        Self {
            labels: rows.iter().map(|r| r.name.clone()).collect(),
            values: DVector::from_iterator(rows.len(), rows.iter().map(|r| r.total as f64)),
        }
    }

    pub(crate) fn from_parts(labels: Vec<String>, values: DVector<f64>) -> Self {
        Self { labels, values }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == label)?;
        Some(self.values[i])
    }

    /// Sum of all entries
    pub fn total(&self) -> f64 {
        self.values.sum()
    }
}

// =============================================================================
// Construction from the clean table
// =============================================================================

/// Build the transition matrix of every state in `table`.
///
/// Row 0 of the table is the nation aggregate and is ignored. State rows
/// must be in the same order as the inflow columns; only the counts are
/// checked, not the names.
pub fn build_transition_matrix(table: &CleanTable) -> ProjectionResult<TransitionMatrix> {
    let states = table.state_rows();
    let n = table.states().len();
    if states.len() != n {
        return Err(ProjectionError::DimensionMismatch {
            expected: n,
            actual: states.len(),
        });
    }

    let mut matrix = DMatrix::zeros(n, n);
    for (o, origin) in states.iter().enumerate() {
        if origin.total == 0 {
            return Err(ProjectionError::ZeroPopulation(origin.name.clone()));
        }
        let total = origin.total as f64;
        for (d, destination) in states.iter().enumerate() {
            matrix[(d, o)] = if d == o {
                origin.stayed as f64 / total
            } else {
                destination.inflows[o] as f64 / total
            };
        }
    }

    let labels = states.iter().map(|r| r.name.clone()).collect();
    let transition = TransitionMatrix::new(labels, matrix)?;

    let open = transition
        .column_sums()
        .iter()
        .filter(|&&s| s < 1.0 - CLOSED_TOLERANCE)
        .count();
    if open > 0 {
        log_warning(format!(
            "{} of {} columns sum below 1 (moves to unmodeled locales)",
            open, n
        ));
    }
    log_info(format!("Built {}x{} transition matrix", n, n));

    Ok(transition)
}

/// Build the transition matrix of a subset table and close it with an
/// [`OTHER_LOCALE`] state standing for every locale left out.
///
/// The `Other` row takes each modeled origin's missing mass. The `Other`
/// column spreads the inflows that no modeled origin accounts for over the
/// population outside the subset (nation total minus modeled totals), and
/// its diagonal keeps the column summing to 1.
///
/// Fails with [`ProjectionError::Degenerate`] when any entry falls outside
/// `[0, 1]`, which happens when the population outside the subset is too
/// small to account for the unexplained inflows.
pub fn close_with_other(table: &CleanTable) -> ProjectionResult<TransitionMatrix> {
    let base = build_transition_matrix(table)?;
    let nation = table
        .nation()
        .ok_or_else(|| ProjectionError::UnknownLocale("nation aggregate".to_string()))?;
    let states = table.state_rows();
    let n = states.len();

    let modeled: i64 = states.iter().map(|r| r.total).sum();
    let other_population = nation.total - modeled;
    if other_population <= 0 {
        return Err(ProjectionError::ZeroPopulation(OTHER_LOCALE.to_string()));
    }
    let other_population = other_population as f64;

    let mut matrix = DMatrix::zeros(n + 1, n + 1);
    for o in 0..n {
        let mut kept = 0.0;
        for d in 0..n {
            matrix[(d, o)] = base.matrix[(d, o)];
            kept += base.matrix[(d, o)];
        }
        matrix[(n, o)] = 1.0 - kept;
    }

    let mut leaving_other = 0.0;
    for (d, destination) in states.iter().enumerate() {
        let modeled_inflow: i64 = destination.inflows.iter().sum();
        let from_other = (destination.total - destination.stayed - modeled_inflow) as f64;
        matrix[(d, n)] = from_other / other_population;
        leaving_other += matrix[(d, n)];
    }
    matrix[(n, n)] = 1.0 - leaving_other;

    if let Some(((d, o), value)) = matrix
        .iter()
        .enumerate()
        .map(|(i, &v)| ((i % (n + 1), i / (n + 1)), v))
        .find(|(_, v)| !(-CLOSED_TOLERANCE..=1.0 + CLOSED_TOLERANCE).contains(v))
    {
        return Err(ProjectionError::Degenerate(format!(
            "{} entry ({}, {}) is {:.3}, outside [0, 1]",
            OTHER_LOCALE, d, o, value
        )));
    }

    let mut labels = base.labels;
    labels.push(OTHER_LOCALE.to_string());
    TransitionMatrix::new(labels, matrix)
}
