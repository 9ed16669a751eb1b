//! Engine seam — the contract between handles and the numerical engine.
//!
//! Handles call these methods in order:
//!
//! ```text
//! let backend = engine.create_solver(view, &snapshot)?;
//! loop {
//!     backend.solve(rhs, x);
//! }
//! drop(backend);   // destroy
//! ```
//!
//! # Implementations
//!
//! - [`NativeEngine`](crate::native::NativeEngine) — pure-Rust AMG + Krylov

use amgkit_params::ParamSnapshot;
use amgkit_sparse::CsrView;
use amgkit_telemetry::EngineReport;
use amgkit_types::{AmgResult, ConvergenceInfo};

/// Factory for built preconditioners and solvers.
///
/// Implementations must copy everything they need out of `matrix` and
/// `params`; neither outlives the call.
pub trait Engine: Send + Sync {
    /// Engine name used in reports.
    fn name(&self) -> &str;

    /// Builds an AMG preconditioner.
    fn create_precond(
        &self,
        matrix: CsrView<'_>,
        params: &ParamSnapshot,
    ) -> AmgResult<Box<dyn PrecondBackend>>;

    /// Builds an AMG-preconditioned Krylov solver.
    fn create_solver(
        &self,
        matrix: CsrView<'_>,
        params: &ParamSnapshot,
    ) -> AmgResult<Box<dyn SolverBackend>>;
}

/// A built preconditioner. Dropping it releases all of its resources.
pub trait PrecondBackend: Send {
    /// Number of unknowns.
    fn size(&self) -> usize;

    /// Number of stored entries of the fine-level matrix.
    fn nonzeros(&self) -> usize;

    /// `x = M⁻¹ rhs`. Both slices have length [`PrecondBackend::size`].
    fn apply(&mut self, rhs: &[f64], x: &mut [f64]);

    /// Structural description of the hierarchy.
    fn report(&self) -> EngineReport;
}

/// A built solver. Dropping it releases all of its resources.
pub trait SolverBackend: Send {
    /// Number of unknowns.
    fn size(&self) -> usize;

    /// Number of stored entries of the bound matrix.
    fn nonzeros(&self) -> usize;

    /// Solves with the bound matrix; `x` holds the initial guess on entry.
    fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> ConvergenceInfo;

    /// Solves with `matrix` for this call only. The bound matrix is kept.
    fn solve_with_matrix(
        &mut self,
        matrix: CsrView<'_>,
        rhs: &[f64],
        x: &mut [f64],
    ) -> AmgResult<ConvergenceInfo>;

    /// Structural description of the hierarchy and the Krylov method.
    fn report(&self) -> EngineReport;
}
