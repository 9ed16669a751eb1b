//! Convergence report produced by every solve call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Iteration count and final residual at solver termination.
///
/// A plain value: it carries no reference back to the session that
/// produced it. Reaching the iteration cap without meeting the tolerance
/// is reported here with `converged == false`, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    /// Number of Krylov iterations performed.
    pub iterations: usize,
    /// Final relative residual `‖b − A x‖ / ‖b‖` (0 for a zero right-hand side).
    pub residual: f64,
    /// Whether the stopping criterion was met within the iteration budget.
    pub converged: bool,
}

impl ConvergenceInfo {
    /// Creates a convergence record.
    pub fn new(iterations: usize, residual: f64, converged: bool) -> Self {
        Self {
            iterations,
            residual,
            converged,
        }
    }

    /// Result for a zero right-hand side: the exact solution is zero.
    pub fn trivial() -> Self {
        Self::new(0, 0.0, true)
    }
}

impl fmt::Display for ConvergenceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iterations: {}, residual: {:.6e}{}",
            self.iterations,
            self.residual,
            if self.converged { "" } else { " (not converged)" }
        )
    }
}
