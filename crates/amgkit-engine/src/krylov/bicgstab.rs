//! Right-preconditioned BiCGStab.

use amgkit_sparse::ops::{axpy, dot, norm, residual, spmv};
use amgkit_sparse::CsrMatrix;
use amgkit_types::ConvergenceInfo;

use super::{finish, rhs_norm, Precond};
use crate::config::KrylovConfig;

/// Solves `A x = b` for general non-singular `A`.
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
    let mut p = vec![0.0; n];
    let mut v = vec![0.0; n];
    let mut ph = vec![0.0; n];
    let mut sh = vec![0.0; n];
    let mut t = vec![0.0; n];

    residual(a, rhs, x, &mut r);
    let shadow = r.clone();
    let mut res = norm(&r);

    let (mut rho_prev, mut alpha, mut omega) = (1.0, 1.0, 1.0);
    let mut iter = 0;

    while res > eps && iter < config.max_iterations {
        let rho = dot(&shadow, &r);
        if rho == 0.0 {
            tracing::debug!(iteration = iter, "BiCGStab breakdown (rho = 0)");
            break;
        }

        if iter == 0 {
            p.copy_from_slice(&r);
        } else {
            let beta = (rho / rho_prev) * (alpha / omega);
            for ((pi, &ri), &vi) in p.iter_mut().zip(&r).zip(&v) {
                *pi = ri + beta * (*pi - omega * vi);
            }
        }

        precond.apply(&p, &mut ph);
        spmv(a, &ph, &mut v);
        let sigma = dot(&shadow, &v);
        if sigma == 0.0 {
            tracing::debug!(iteration = iter, "BiCGStab breakdown (shadow ⟂ v)");
            break;
        }
        alpha = rho / sigma;

        // r now holds s = r − α v.
        axpy(-alpha, &v, &mut r);
        iter += 1;

        let s_norm = norm(&r);
        if s_norm <= eps {
            axpy(alpha, &ph, x);
            res = s_norm;
            tracing::trace!(iteration = iter, residual = res / norm_rhs, "BiCGStab");
            break;
        }

        precond.apply(&r, &mut sh);
        spmv(a, &sh, &mut t);
        let tt = dot(&t, &t);
        omega = if tt > 0.0 { dot(&t, &r) / tt } else { 0.0 };

        axpy(alpha, &ph, x);
        axpy(omega, &sh, x);
        axpy(-omega, &t, &mut r);

        res = norm(&r);
        rho_prev = rho;
        tracing::trace!(iteration = iter, residual = res / norm_rhs, "BiCGStab");

        if omega == 0.0 {
            tracing::debug!(iteration = iter, "BiCGStab stagnation (omega = 0)");
            break;
        }
    }

    finish(iter, res, norm_rhs, eps)
}
