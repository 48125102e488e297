//! Newton-Raphson nonlinear solver.

use nalgebra::DVector;
use nodal_core::mna::MnaSystem;

use crate::error::{Error, Result};
use crate::linear::solve_with_tolerance;

/// Convergence criteria for Newton-Raphson iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceCriteria {
    /// Iteration stops once the summed absolute update Σ|x_new - x_old|
    /// falls below this.
    pub tolerance: f64,
    /// Maximum iterations before failure.
    pub max_iterations: usize,
    /// Conductance shunted across nonlinear junctions (S).
    pub gmin: f64,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 100,
            gmin: 1e-12,
        }
    }
}

/// Callback for stamping nonlinear devices at each iteration.
///
/// Given the current solution vector, the stamper fills a cleared MNA system
/// with every linear device plus the nonlinear devices linearized at that
/// solution. It may keep linearization state between calls.
pub trait NonlinearStamper {
    /// Re-stamp the MNA system for the current solution.
    fn stamp_at(&mut self, mna: &mut MnaSystem, solution: &DVector<f64>);
}

/// Result of Newton-Raphson iteration.
#[derive(Debug, Clone)]
pub struct NrResult {
    /// Solution vector.
    pub solution: DVector<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
}

/// Solve a nonlinear system using Newton-Raphson iteration.
///
/// # Arguments
/// * `num_nodes` - Number of nodes (excluding ground)
/// * `num_branches` - Number of branch current unknowns
/// * `stamper` - Callback to stamp the system at each iteration point
/// * `criteria` - Convergence criteria
/// * `pivot_tolerance` - Pivot threshold passed to the linear solver
/// * `initial_guess` - Optional initial solution guess
pub fn solve_newton_raphson(
    num_nodes: usize,
    num_branches: usize,
    stamper: &mut dyn NonlinearStamper,
    criteria: &ConvergenceCriteria,
    pivot_tolerance: f64,
    initial_guess: Option<&DVector<f64>>,
) -> Result<NrResult> {
    let size = num_nodes + num_branches;

    let mut solution = match initial_guess {
        Some(guess) if guess.len() == size => guess.clone(),
        _ => DVector::zeros(size),
    };

    let mut mna = MnaSystem::new(num_nodes, num_branches);
    let mut delta = f64::INFINITY;

    for iteration in 0..criteria.max_iterations {
        mna.clear();
        stamper.stamp_at(&mut mna, &solution);

        let new_solution = solve_with_tolerance(mna.matrix(), mna.rhs(), pivot_tolerance)?;

        delta = (&new_solution - &solution).abs().sum();
        solution = new_solution;
        log::debug!("newton iteration {}: delta = {:e}", iteration + 1, delta);

        if delta < criteria.tolerance {
            return Ok(NrResult {
                solution,
                iterations: iteration + 1,
            });
        }
    }

    log::warn!(
        "newton-raphson did not converge after {} iterations (delta = {:e})",
        criteria.max_iterations,
        delta
    );
    Err(Error::ConvergenceFailed {
        iterations: criteria.max_iterations,
        delta,
        last_iterate: solution,
    })
}
