//! Markov projection of state populations.
//!
//! This module provides:
//! - `matrix`: transition matrix and population vector, built from a clean table
//! - `projection`: fixed-step and steady-state projection
//!
//! ## Usage Flow
//!
//! ```text
//! CleanTable → build_transition_matrix → project_forward / steady_state → PopulationVector
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use state_migration::markov::{build_transition_matrix, project_forward, PopulationVector};
//!
//! let matrix = build_transition_matrix(&table)?;
//! let start = PopulationVector::from_table(&table);
//! let in_ten_years = project_forward(&matrix, &start, 10)?;
//! ```

pub mod matrix;
pub mod projection;

// Re-exports for convenience
pub use matrix::{build_transition_matrix, close_with_other, PopulationVector, TransitionMatrix, OTHER_LOCALE};
pub use projection::{project_forward, steady_state};
