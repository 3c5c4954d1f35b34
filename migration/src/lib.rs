//! # State Migration - census migration tables as Markov chains
//!
//! Cleans the Census Bureau's state-to-state migration workbook into a
//! rectangular table, derives a transition matrix of migration fractions
//! between states, and projects populations forward or to steady state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Census .xls │────▶│   Parser    │────▶│  Normalize  │────▶│   Markov    │
//! │  (or .csv)  │     │ (RawSheet)  │     │ (CleanTable)│     │ (projection)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use state_migration::{
//!     build_transition_matrix, normalize, read_sheet, steady_state, PopulationVector, SheetLayout,
//! };
//!
//! let layout = SheetLayout::default();
//! let table = normalize(&read_sheet("State_to_State_Migrations_Table_2019.xls", &layout)?, &layout)?;
//! let matrix = build_transition_matrix(&table)?;
//! let steady = steady_state(&matrix, &PopulationVector::from_table(&table))?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`layout`] - Structural constants of the published workbook
//! - [`models`] - Clean table and locale rows
//! - [`parser`] - Spreadsheet and CSV reading
//! - [`normalize`] - Raw sheet to clean table
//! - [`markov`] - Transition matrices and projection
//! - [`report`] - The command-line report
//! - [`logs`] - Progress logging

// Core modules
pub mod error;
pub mod layout;
pub mod logs;
pub mod models;

// Reading and cleaning
pub mod normalize;
pub mod parser;

// Projection
pub mod markov;

// Entry point pipeline
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{NormalizeError, PipelineError, ProjectionError, ReadError};

// =============================================================================
// Re-exports - Models and configuration
// =============================================================================

pub use layout::SheetLayout;
pub use models::{CleanTable, LocaleRow};

// =============================================================================
// Re-exports - Reading and cleaning
// =============================================================================

pub use normalize::normalize;
pub use parser::{read_sheet, RawRow, RawSheet};

// =============================================================================
// Re-exports - Projection
// =============================================================================

pub use markov::{
    build_transition_matrix,
    close_with_other,
    project_forward,
    steady_state,
    PopulationVector,
    TransitionMatrix,
};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::run_report;
