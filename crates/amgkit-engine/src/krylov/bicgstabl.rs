//! Right-preconditioned BiCGStab(L).
//!
//! Each iteration performs `L` BiCG steps followed by an `L`-dimensional
//! minimal residual correction (Sleijpen & Fokkema). The iteration runs on
//! `B = A M⁻¹` for a correction `y`; the solution is updated once at the
//! end with `x += M⁻¹ y`. One iteration costs `2L` products with `B`.

use amgkit_sparse::ops::{axpby, axpy, dot, norm, residual, spmv};
use amgkit_sparse::CsrMatrix;
use amgkit_types::ConvergenceInfo;

use super::{finish, rhs_norm, Precond};
use crate::config::KrylovConfig;

/// `out = A M⁻¹ input`, with `z` as scratch.
fn apply_operator(
    a: &CsrMatrix,
    precond: &mut dyn Precond,
    z: &mut [f64],
    input: &[f64],
    out: &mut [f64],
) {
    precond.apply(input, z);
    spmv(a, z, out);
}

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
    let l = config.order;

    let mut r = vec![vec![0.0; n]; l + 1];
    let mut u = vec![vec![0.0; n]; l + 1];
    let mut y = vec![0.0; n];
    let mut z = vec![0.0; n];

    residual(a, rhs, x, &mut r[0]);
    let shadow = r[0].clone();
    let mut res = norm(&r[0]);

    let mut tau = vec![vec![0.0; l + 1]; l + 1];
    let mut sigma = vec![0.0; l + 1];
    let mut gamma = vec![0.0; l + 1];
    let mut gamma_p = vec![0.0; l + 1];
    let mut gamma_pp = vec![0.0; l + 1];

    let (mut rho0, mut alpha, mut omega) = (1.0, 0.0, 1.0);
    let mut iter = 0;

    'outer: while res > eps && iter < config.max_iterations {
        iter += 1;
        rho0 *= -omega;

        // BiCG part.
        for j in 0..l {
            if rho0 == 0.0 {
                tracing::debug!(iteration = iter, "BiCGStab(L) breakdown (rho = 0)");
                break 'outer;
            }
            let rho1 = dot(&r[j], &shadow);
            let beta = alpha * rho1 / rho0;
            rho0 = rho1;

            for i in 0..=j {
                axpby(1.0, &r[i], -beta, &mut u[i]);
            }
            {
                let (lo, hi) = u.split_at_mut(j + 1);
                apply_operator(a, precond, &mut z, &lo[j], &mut hi[0]);
            }

            let g = dot(&u[j + 1], &shadow);
            if g == 0.0 {
                tracing::debug!(iteration = iter, "BiCGStab(L) breakdown (gamma = 0)");
                break 'outer;
            }
            alpha = rho0 / g;

            for i in 0..=j {
                axpy(-alpha, &u[i + 1], &mut r[i]);
            }
            {
                let (lo, hi) = r.split_at_mut(j + 1);
                apply_operator(a, precond, &mut z, &lo[j], &mut hi[0]);
            }
            axpy(alpha, &u[0], &mut y);

            res = norm(&r[0]);
            if res <= eps {
                tracing::trace!(iteration = iter, residual = res / norm_rhs, "BiCGStab(L)");
                break 'outer;
            }
        }

        // MR part: modified Gram–Schmidt on r_1..r_L.
        for j in 1..=l {
            for i in 1..j {
                let t = if sigma[i] > 0.0 {
                    dot(&r[j], &r[i]) / sigma[i]
                } else {
                    0.0
                };
                tau[i][j] = t;
                let (lo, hi) = r.split_at_mut(j);
                axpy(-t, &lo[i], &mut hi[0]);
            }
            sigma[j] = dot(&r[j], &r[j]);
            gamma_p[j] = if sigma[j] > 0.0 {
                dot(&r[0], &r[j]) / sigma[j]
            } else {
                0.0
            };
        }

        gamma[l] = gamma_p[l];
        omega = gamma[l];
        for j in (1..l).rev() {
            let tail: f64 = (j + 1..=l).map(|i| tau[j][i] * gamma[i]).sum();
            gamma[j] = gamma_p[j] - tail;
        }
        for j in 1..l {
            let tail: f64 = (j + 1..l).map(|i| tau[j][i] * gamma[i + 1]).sum();
            gamma_pp[j] = gamma[j + 1] + tail;
        }

        axpy(gamma[1], &r[0], &mut y);
        {
            let (lo, hi) = r.split_at_mut(l);
            axpy(-gamma_p[l], &hi[0], &mut lo[0]);
        }
        {
            let (lo, hi) = u.split_at_mut(l);
            axpy(-gamma[l], &hi[0], &mut lo[0]);
        }
        for j in 1..l {
            {
                let (lo, hi) = u.split_at_mut(j);
                axpy(-gamma[j], &hi[0], &mut lo[0]);
            }
            axpy(gamma_pp[j], &r[j], &mut y);
            let (lo, hi) = r.split_at_mut(j);
            axpy(-gamma_p[j], &hi[0], &mut lo[0]);
        }

        res = norm(&r[0]);
        tracing::trace!(iteration = iter, residual = res / norm_rhs, "BiCGStab(L)");

        if omega == 0.0 || !omega.is_finite() {
            tracing::debug!(iteration = iter, "BiCGStab(L) stagnation (omega = 0)");
            break;
        }
    }

    if iter > 0 {
        precond.apply(&y, &mut z);
        axpy(1.0, &z, x);
    }

    finish(iter, res, norm_rhs, eps)
}
