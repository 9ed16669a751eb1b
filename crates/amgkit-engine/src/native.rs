//! Pure-Rust engine: AMG hierarchy plus Krylov iteration.

use std::time::Instant;

use amgkit_params::ParamSnapshot;
use amgkit_sparse::{CsrMatrix, CsrView};
use amgkit_telemetry::{EngineReport, SolverSummary};
use amgkit_types::{AmgError, AmgResult, ConvergenceInfo};

use crate::config::{warn_unknown, AmgConfig, KrylovConfig};
use crate::hierarchy::AmgHierarchy;
use crate::krylov;
use crate::traits::{Engine, PrecondBackend, SolverBackend};

/// The default engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl NativeEngine {
    /// Name used in reports.
    pub const NAME: &'static str = "native";

    pub fn new() -> Self {
        Self
    }
}

/// Copies and validates the view, then builds the hierarchy.
fn build_hierarchy(matrix: CsrView<'_>, config: &AmgConfig) -> AmgResult<(CsrMatrix, AmgHierarchy)> {
    let a = matrix.to_matrix()?;
    let start = Instant::now();
    let hierarchy = AmgHierarchy::build(a.clone(), config)?;
    tracing::debug!(
        unknowns = a.rows,
        nonzeros = a.nnz(),
        levels = hierarchy.num_levels(),
        direct = hierarchy.is_direct(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "AMG setup complete"
    );
    Ok((a, hierarchy))
}

impl Engine for NativeEngine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create_precond(
        &self,
        matrix: CsrView<'_>,
        params: &ParamSnapshot,
    ) -> AmgResult<Box<dyn PrecondBackend>> {
        let build = || -> AmgResult<Box<dyn PrecondBackend>> {
            warn_unknown(params);
            let config = AmgConfig::from_snapshot(params)?;
            let (_, hierarchy) = build_hierarchy(matrix, &config)?;
            Ok(Box::new(NativePrecond { hierarchy }))
        };
        build().map_err(AmgError::into_construction)
    }

    fn create_solver(
        &self,
        matrix: CsrView<'_>,
        params: &ParamSnapshot,
    ) -> AmgResult<Box<dyn SolverBackend>> {
        let build = || -> AmgResult<Box<dyn SolverBackend>> {
            warn_unknown(params);
            let amg = AmgConfig::from_snapshot(params)?;
            let krylov = KrylovConfig::from_snapshot(params)?;
            let (matrix, hierarchy) = build_hierarchy(matrix, &amg)?;
            Ok(Box::new(NativeSolver {
                matrix,
                hierarchy,
                amg,
                krylov,
            }))
        };
        build().map_err(AmgError::into_construction)
    }
}

/// Built AMG preconditioner.
pub struct NativePrecond {
    hierarchy: AmgHierarchy,
}

impl PrecondBackend for NativePrecond {
    fn size(&self) -> usize {
        self.hierarchy.size()
    }

    fn nonzeros(&self) -> usize {
        self.hierarchy.fine().nnz()
    }

    fn apply(&mut self, rhs: &[f64], x: &mut [f64]) {
        self.hierarchy.apply(rhs, x);
    }

    fn report(&self) -> EngineReport {
        self.hierarchy.report(NativeEngine::NAME)
    }
}

/// Built AMG-preconditioned Krylov solver.
///
/// The Krylov iteration needs the operator while the hierarchy is borrowed
/// mutably, so the solver keeps its own copy of the fine matrix.
pub struct NativeSolver {
    matrix: CsrMatrix,
    hierarchy: AmgHierarchy,
    amg: AmgConfig,
    krylov: KrylovConfig,
}

impl SolverBackend for NativeSolver {
    fn size(&self) -> usize {
        self.matrix.rows
    }

    fn nonzeros(&self) -> usize {
        self.matrix.nnz()
    }

    fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> ConvergenceInfo {
        krylov::solve(&self.matrix, &mut self.hierarchy, &self.krylov, rhs, x)
    }

    fn solve_with_matrix(
        &mut self,
        matrix: CsrView<'_>,
        rhs: &[f64],
        x: &mut [f64],
    ) -> AmgResult<ConvergenceInfo> {
        if matrix.n != self.matrix.rows {
            return Err(AmgError::DimensionMismatch {
                what: "matrix",
                expected: self.matrix.rows,
                actual: matrix.n,
            });
        }
        let (a, mut hierarchy) =
            build_hierarchy(matrix, &self.amg).map_err(AmgError::into_construction)?;
        Ok(krylov::solve(&a, &mut hierarchy, &self.krylov, rhs, x))
    }

    fn report(&self) -> EngineReport {
        let mut report = self.hierarchy.report(NativeEngine::NAME);
        report.solver = Some(SolverSummary {
            method: krylov::method_label(&self.krylov),
            max_iterations: self.krylov.max_iterations,
            tolerance: self.krylov.tol,
        });
        report
    }
}
