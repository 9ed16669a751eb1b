//! Restarted right-preconditioned GMRES(M) with Givens rotations.

use amgkit_sparse::ops::{axpy, dot, norm, residual, spmv};
use amgkit_sparse::CsrMatrix;
use amgkit_types::ConvergenceInfo;

use super::{finish, rhs_norm, Precond};
use crate::config::KrylovConfig;

/// Solves `A x = b` for general non-singular `A`.
///
/// Each inner step counts as one iteration. The true residual is
/// recomputed at every restart.
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
    let m = config.restart;

    let mut basis = vec![vec![0.0; n]; m + 1];
    let mut h = vec![vec![0.0; m]; m + 1];
    let mut cs = vec![0.0; m];
    let mut sn = vec![0.0; m];
    let mut g = vec![0.0; m + 1];
    let mut z = vec![0.0; n];
    let mut w = vec![0.0; n];
    let mut r = vec![0.0; n];

    residual(a, rhs, x, &mut r);
    let mut res = norm(&r);
    let mut iter = 0;

    while res > eps && iter < config.max_iterations {
        for (b, &ri) in basis[0].iter_mut().zip(&r) {
            *b = ri / res;
        }
        g.fill(0.0);
        g[0] = res;

        let mut k = 0;
        while k < m && iter < config.max_iterations {
            precond.apply(&basis[k], &mut z);
            spmv(a, &z, &mut w);

            for i in 0..=k {
                let hik = dot(&w, &basis[i]);
                h[i][k] = hik;
                axpy(-hik, &basis[i], &mut w);
            }
            let h_next = norm(&w);
            h[k + 1][k] = h_next;
            if h_next > 0.0 {
                for (b, &wi) in basis[k + 1].iter_mut().zip(&w) {
                    *b = wi / h_next;
                }
            }

            for i in 0..k {
                let (upper, lower) = (h[i][k], h[i + 1][k]);
                h[i][k] = cs[i] * upper + sn[i] * lower;
                h[i + 1][k] = -sn[i] * upper + cs[i] * lower;
            }
            let denom = h[k][k].hypot(h[k + 1][k]);
            if denom > 0.0 {
                cs[k] = h[k][k] / denom;
                sn[k] = h[k + 1][k] / denom;
                h[k][k] = denom;
            } else {
                cs[k] = 1.0;
                sn[k] = 0.0;
            }
            h[k + 1][k] = 0.0;
            g[k + 1] = -sn[k] * g[k];
            g[k] *= cs[k];

            k += 1;
            iter += 1;
            let estimate = g[k].abs();
            tracing::trace!(iteration = iter, residual = estimate / norm_rhs, "GMRES");
            if estimate <= eps || h_next == 0.0 {
                break;
            }
        }

        // Back substitution for the k × k triangular system.
        let mut coeffs = g[..k].to_vec();
        for i in (0..k).rev() {
            let tail: f64 = (i + 1..k).map(|j| h[i][j] * coeffs[j]).sum();
            coeffs[i] = if h[i][i] != 0.0 {
                (coeffs[i] - tail) / h[i][i]
            } else {
                0.0
            };
        }

        w.fill(0.0);
        for (v, &c) in basis.iter().zip(&coeffs) {
            axpy(c, v, &mut w);
        }
        precond.apply(&w, &mut z);
        axpy(1.0, &z, x);

        residual(a, rhs, x, &mut r);
        res = norm(&r);
    }

    finish(iter, res, norm_rhs, eps)
}
