//! Error types for the migration pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ReadError`] - Reading the raw census sheet
//! - [`NormalizeError`] - The sheet does not have the expected fixed structure
//! - [`ProjectionError`] - Transition matrix and population vector errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Sheet Reading Errors
// =============================================================================

/// Errors while reading the raw sheet from disk.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid delimited text.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// The spreadsheet container could not be opened or decoded.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// The workbook has no worksheet.
    #[error("Workbook contains no worksheet")]
    NoWorksheet,

    /// Nothing to read.
    #[error("Sheet is empty")]
    EmptySheet,

    /// The grid is too small for the configured boilerplate offsets.
    #[error("Sheet structure mismatch: {0}")]
    Structure(#[from] NormalizeError),
}

impl From<calamine::Error> for ReadError {
    fn from(err: calamine::Error) -> Self {
        ReadError::Spreadsheet(err.to_string())
    }
}

// =============================================================================
// Structural Mismatch Errors
// =============================================================================

/// The raw sheet deviates from the fixed published layout.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// An expected column label is absent.
    #[error("Missing expected column: {0}")]
    MissingColumn(String),

    /// An expected row is absent at its fixed position.
    #[error("Missing expected row at position {0}")]
    MissingRow(usize),

    /// A row or column count differs from the layout.
    #[error("Expected {expected} {what}, found {actual}")]
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A count cell is not a non-negative integer.
    #[error("Row {row}, column '{column}' (value '{value}'): {message}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
        message: String,
    },

    /// More people stayed than live in the locale.
    #[error("Stayed count exceeds total population for '{0}'")]
    StayedExceedsTotal(String),
}

// =============================================================================
// Projection Errors
// =============================================================================

/// Errors from building or applying a transition matrix.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Shapes of a matrix/vector pairing are incompatible.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A locale has zero total population.
    #[error("Division by zero: '{0}' has no population")]
    ZeroPopulation(String),

    /// A locale name is not in the table.
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// The eigen-solver gave no usable steady state.
    #[error("Degenerate matrix: {0}")]
    Degenerate(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::report::run_report`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading error.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Normalization error.
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Projection error.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Writing the report failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the CSV rendering failed.
    #[error("Output error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // NormalizeError -> PipelineError
        let err = NormalizeError::MissingColumn("Estimate.3".into());
        let pipeline_err: PipelineError = err.into();
        assert!(pipeline_err.to_string().contains("Estimate.3"));

        // ProjectionError -> PipelineError
        let err = ProjectionError::ZeroPopulation("Wyoming".into());
        let pipeline_err: PipelineError = err.into();
        assert!(pipeline_err.to_string().contains("Wyoming"));
    }

    #[test]
    fn test_invalid_cell_format() {
        let err = NormalizeError::InvalidCell {
            row: 4,
            column: "Total".into(),
            value: "abc".into(),
            message: "not an integer".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 4"));
        assert!(msg.contains("column 'Total'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_shape_format() {
        let err = NormalizeError::Shape {
            what: "rows",
            expected: 52,
            actual: 50,
        };
        assert_eq!(err.to_string(), "Expected 52 rows, found 50");
    }
}
