//! Population projection: fixed number of steps, or the steady state.

use nalgebra::{Complex, DMatrix, Schur};
use std::cmp::Ordering;

use super::matrix::{PopulationVector, TransitionMatrix};
use crate::error::{ProjectionError, ProjectionResult};
use crate::logs::log_warning;

/// Iteration cap for the Schur and SVD solvers
const MAX_SOLVER_ITERATIONS: usize = 100_000;

/// Distance from 1 at which the selected eigenvalue is reported
const UNIT_EIGENVALUE_TOLERANCE: f64 = 1e-6;

fn check_dimensions(matrix: &TransitionMatrix, population: &PopulationVector) -> ProjectionResult<()> {
    if population.len() != matrix.dim() {
        return Err(ProjectionError::DimensionMismatch {
            expected: matrix.dim(),
            actual: population.len(),
        });
    }
    Ok(())
}

/// Apply the transition matrix `steps` times: `v ← M·v`.
///
/// Zero steps returns the starting population. Nothing is clamped or
/// renormalized, so an open matrix loses population every step.
pub fn project_forward(
    matrix: &TransitionMatrix,
    population: &PopulationVector,
    steps: usize,
) -> ProjectionResult<PopulationVector> {
    check_dimensions(matrix, population)?;

    let mut current = population.values().clone();
    for _ in 0..steps {
        current = matrix.matrix() * &current;
    }
    Ok(PopulationVector::from_parts(population.labels().to_vec(), current))
}

/// Population at the steady state of `matrix`, with the same total as
/// `population`.
///
/// Picks the eigenvalue with the largest real part (ties broken by the
/// imaginary part), takes its eigenvector, divides it by its entry sum and
/// scales it by the starting total. For a column-stochastic matrix the
/// pick is the Perron eigenvalue 1; any other pick is logged, not refused.
pub fn steady_state(matrix: &TransitionMatrix, population: &PopulationVector) -> ProjectionResult<PopulationVector> {
    check_dimensions(matrix, population)?;
    let n = matrix.dim();
    if n == 0 {
        return Err(ProjectionError::Degenerate("empty matrix".to_string()));
    }

    let schur = Schur::try_new(matrix.matrix().clone(), f64::EPSILON, MAX_SOLVER_ITERATIONS)
        .ok_or_else(|| ProjectionError::Degenerate("eigenvalue iteration did not converge".to_string()))?;
    let eigenvalues = schur.complex_eigenvalues();

    let lambda = eigenvalues
        .iter()
        .copied()
        .max_by(|a, b| {
            a.re.partial_cmp(&b.re)
                .unwrap_or(Ordering::Equal)
                .then(a.im.partial_cmp(&b.im).unwrap_or(Ordering::Equal))
        })
        .ok_or_else(|| ProjectionError::Degenerate("no eigenvalues".to_string()))?;

    if lambda.im != 0.0 || (lambda.re - 1.0).abs() > UNIT_EIGENVALUE_TOLERANCE {
        log_warning(format!(
            "Dominant eigenvalue is {:.6}{:+.6}i, not 1; the matrix is not column-stochastic",
            lambda.re, lambda.im
        ));
    }

    let eigenvector = null_vector(matrix.matrix(), lambda)?;
    let sum: Complex<f64> = eigenvector.iter().sum();
    if sum.norm() <= f64::EPSILON {
        return Err(ProjectionError::Degenerate(
            "eigenvector entries sum to zero".to_string(),
        ));
    }

    let scale = population.total();
    let values: Vec<f64> = eigenvector.iter().map(|c| (c / sum).re * scale).collect();
    PopulationVector::new(population.labels().to_vec(), values)
}

/// Unit vector `x` minimizing `|(M - λI)x|`: the eigenvector of `λ`.
fn null_vector(matrix: &DMatrix<f64>, lambda: Complex<f64>) -> ProjectionResult<Vec<Complex<f64>>> {
    let n = matrix.nrows();
    let shifted = matrix.map(|x| Complex::new(x, 0.0)) - DMatrix::from_diagonal_element(n, n, lambda);

    let svd = shifted
        .try_svd(false, true, f64::EPSILON, MAX_SOLVER_ITERATIONS)
        .ok_or_else(|| ProjectionError::Degenerate("singular value iteration did not converge".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| ProjectionError::Degenerate("missing right singular vectors".to_string()))?;

    let (smallest, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
        .ok_or_else(|| ProjectionError::Degenerate("no singular values".to_string()))?;

    // Rows of V^H are conjugated right singular vectors
    Ok(v_t.row(smallest).iter().map(|c| c.conj()).collect())
}
