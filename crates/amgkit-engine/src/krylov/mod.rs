//! Preconditioned Krylov methods.
//!
//! Every method:
//! - starts from the initial guess in `x`,
//! - stops when `‖b − A x‖ ≤ max(tol · ‖b‖, abstol)` or after `maxiter` iterations,
//! - returns `x = 0` with zero iterations and zero residual when `b = 0`,
//! - reports the relative residual `‖b − A x‖ / ‖b‖`.
//!
//! BiCGStab, BiCGStab(L) and GMRES are right-preconditioned, so the
//! residual they monitor is the true residual of the original system.

pub mod bicgstab;
pub mod bicgstabl;
pub mod cg;
pub mod gmres;

use amgkit_sparse::ops::norm;
use amgkit_sparse::CsrMatrix;
use amgkit_types::ConvergenceInfo;

use crate::config::{KrylovConfig, KrylovKind};
use crate::hierarchy::AmgHierarchy;

/// Approximate inverse applied inside a Krylov iteration.
pub trait Precond {
    /// `x = M⁻¹ rhs`.
    fn apply(&mut self, rhs: &[f64], x: &mut [f64]);
}

impl Precond for AmgHierarchy {
    fn apply(&mut self, rhs: &[f64], x: &mut [f64]) {
        AmgHierarchy::apply(self, rhs, x);
    }
}

/// No preconditioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Precond for Identity {
    fn apply(&mut self, rhs: &[f64], x: &mut [f64]) {
        x.copy_from_slice(rhs);
    }
}

/// Runs the method selected by `config.kind`.
pub fn solve(
    a: &CsrMatrix,
    precond: &mut dyn Precond,
    config: &KrylovConfig,
    rhs: &[f64],
    x: &mut [f64],
) -> ConvergenceInfo {
    let info = match config.kind {
        KrylovKind::Cg => cg::solve(a, precond, config, rhs, x),
        KrylovKind::BiCgStab => bicgstab::solve(a, precond, config, rhs, x),
        KrylovKind::BiCgStabL => bicgstabl::solve(a, precond, config, rhs, x),
        KrylovKind::Gmres => gmres::solve(a, precond, config, rhs, x),
    };
    tracing::debug!(
        method = config.kind.as_str(),
        iterations = info.iterations,
        residual = info.residual,
        converged = info.converged,
        "solve finished"
    );
    info
}

/// Human-readable method label, e.g. `BiCGStab(2)`.
pub fn method_label(config: &KrylovConfig) -> String {
    match config.kind {
        KrylovKind::Cg => "CG".to_string(),
        KrylovKind::BiCgStab => "BiCGStab".to_string(),
        KrylovKind::BiCgStabL => format!("BiCGStab({})", config.order),
        KrylovKind::Gmres => format!("GMRES({})", config.restart),
    }
}

/// Norm of `rhs`, or `None` after zeroing `x` when `rhs` is zero.
fn rhs_norm(rhs: &[f64], x: &mut [f64]) -> Option<f64> {
    let norm_rhs = norm(rhs);
    if norm_rhs == 0.0 {
        x.fill(0.0);
        None
    } else {
        Some(norm_rhs)
    }
}

fn finish(iterations: usize, res_norm: f64, norm_rhs: f64, eps: f64) -> ConvergenceInfo {
    ConvergenceInfo::new(iterations, res_norm / norm_rhs, res_norm <= eps)
}
