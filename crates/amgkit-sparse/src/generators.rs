//! Procedural sample problems for drivers, benchmarks and testing.
//!
//! These generators produce deterministic, resolution-configurable
//! systems with a known structure.

use serde::{Deserialize, Serialize};

use crate::csr::CsrMatrix;

/// A linear system `A x = rhs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleProblem {
    /// System matrix.
    pub matrix: CsrMatrix,
    /// Right-hand side.
    pub rhs: Vec<f64>,
}

impl SampleProblem {
    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.matrix.rows
    }
}

/// 3-D Poisson problem on an `n × n × n` grid (7-point stencil).
///
/// Unknowns are numbered with `i` fastest, then `j`, then `k`. Grid spacing
/// is `hx = 1`, `hy = hx · anisotropy`, `hz = hy · anisotropy`; the
/// right-hand side is 1 in every row.
///
/// # Example
/// ```
/// use amgkit_sparse::generators::poisson3d;
/// let problem = poisson3d(4, 1.0);
/// assert_eq!(problem.size(), 64);
/// assert_eq!(problem.matrix.nnz(), 64 * 7 - 6 * 16);
/// ```
pub fn poisson3d(n: usize, anisotropy: f64) -> SampleProblem {
    let n3 = n * n * n;

    let hx = 1.0;
    let hy = hx * anisotropy;
    let hz = hy * anisotropy;

    let wx = -1.0 / (hx * hx);
    let wy = -1.0 / (hy * hy);
    let wz = -1.0 / (hz * hz);
    let diag = 2.0 / (hx * hx) + 2.0 / (hy * hy) + 2.0 / (hz * hz);

    let mut row_ptr = Vec::with_capacity(n3 + 1);
    let mut col_idx = Vec::with_capacity(n3 * 7);
    let mut values = Vec::with_capacity(n3 * 7);
    row_ptr.push(0);

    let mut idx = 0;
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                // Columns are emitted in increasing order.
                if k > 0 {
                    col_idx.push(idx - n * n);
                    values.push(wz);
                }
                if j > 0 {
                    col_idx.push(idx - n);
                    values.push(wy);
                }
                if i > 0 {
                    col_idx.push(idx - 1);
                    values.push(wx);
                }

                col_idx.push(idx);
                values.push(diag);

                if i + 1 < n {
                    col_idx.push(idx + 1);
                    values.push(wx);
                }
                if j + 1 < n {
                    col_idx.push(idx + n);
                    values.push(wy);
                }
                if k + 1 < n {
                    col_idx.push(idx + n * n);
                    values.push(wz);
                }

                row_ptr.push(col_idx.len());
                idx += 1;
            }
        }
    }

    SampleProblem {
        matrix: CsrMatrix {
            rows: n3,
            cols: n3,
            row_ptr,
            col_idx,
            values,
        },
        rhs: vec![1.0; n3],
    }
}

/// Tridiagonal `n × n` matrix with constant bands.
///
/// Handy for small non-symmetric systems (`lower != upper`).
pub fn tridiagonal(n: usize, lower: f64, diag: f64, upper: f64) -> CsrMatrix {
    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        if i > 0 {
            triplets.push((i, i - 1, lower));
        }
        triplets.push((i, i, diag));
        if i + 1 < n {
            triplets.push((i, i + 1, upper));
        }
    }
    CsrMatrix::from_triplets(n, n, &triplets)
}
