//! Preconditioned conjugate gradient.

use amgkit_sparse::ops::{axpby, axpy, dot, norm, residual, spmv};
use amgkit_sparse::CsrMatrix;
use amgkit_types::ConvergenceInfo;

use super::{finish, rhs_norm, Precond};
use crate::config::KrylovConfig;

/// Solves `A x = b` for symmetric positive definite `A`.
pub fn solve(
    a: &CsrMatrix,
    precond: &mut dyn Precond,
    config: &KrylovConfig,
    rhs: &[f64],
    x: &mut [f64],
) -> ConvergenceInfo {
    let Some(norm_rhs) = rhs_norm(rhs, x) else {
        return ConvergenceInfo::trivial();
    };
    let eps = config.threshold(norm_rhs);
    let n = rhs.len();

    let mut r = vec![0.0; n];
    let mut s = vec![0.0; n];
    let mut p = vec![0.0; n];
    let mut q = vec![0.0; n];

    residual(a, rhs, x, &mut r);
    let mut res = norm(&r);
    let mut rho_prev = 1.0;
    let mut iter = 0;

    while res > eps && iter < config.max_iterations {
        precond.apply(&r, &mut s);
        let rho = dot(&r, &s);

        if iter == 0 {
            p.copy_from_slice(&s);
        } else {
            axpby(1.0, &s, rho / rho_prev, &mut p);
        }

        spmv(a, &p, &mut q);
        let curvature = dot(&q, &p);
        if curvature == 0.0 || !curvature.is_finite() {
            tracing::debug!(iteration = iter, "CG breakdown");
            break;
        }
        let alpha = rho / curvature;

        axpy(alpha, &p, x);
        axpy(-alpha, &q, &mut r);

        rho_prev = rho;
        res = norm(&r);
        iter += 1;
        tracing::trace!(iteration = iter, residual = res / norm_rhs, "CG");
    }

    finish(iter, res, norm_rhs, eps)
}
