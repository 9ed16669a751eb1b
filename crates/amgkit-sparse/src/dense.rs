//! Dense LU solver for the coarsest multigrid level, backed by `faer`.
//!
//! The coarsest operator is small (at most `coarse_enough` unknowns), so it
//! is expanded to a dense matrix and factorized once with partial pivoting.
//!
//! ## Workflow
//! 1. `factorize(matrix)` — CSR → dense, partial-pivot LU
//! 2. `solve(rhs, x)` — forward/backward substitution (cached factorization)

use faer::linalg::solvers::{PartialPivLu, Solve};
use faer::Mat;

use amgkit_types::{AmgError, AmgResult};

use crate::csr::CsrMatrix;

/// Cached dense LU factorization.
pub struct DenseLu {
    lu: PartialPivLu<f64>,
    dimension: usize,
}

impl DenseLu {
    /// Factorizes a square CSR matrix.
    ///
    /// Fails when the matrix is not square or when the factorization
    /// produces non-finite values (singular coarse operator).
    pub fn factorize(matrix: &CsrMatrix) -> AmgResult<Self> {
        if matrix.rows != matrix.cols {
            return Err(AmgError::InvalidMatrix(format!(
                "coarse matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        let n = matrix.rows;

        let mut dense = Mat::<f64>::zeros(n, n);
        for i in 0..n {
            let (cols, vals) = matrix.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                dense[(i, j)] += v;
            }
        }

        let lu = dense.as_ref().partial_piv_lu();
        let factorization = Self { lu, dimension: n };

        // A singular operator shows up as inf/NaN in the substitution.
        let probe = vec![1.0; n];
        let mut out = vec![0.0; n];
        factorization.solve(&probe, &mut out);
        if out.iter().any(|v| !v.is_finite()) {
            return Err(AmgError::InvalidMatrix(
                "coarse level operator is singular".into(),
            ));
        }

        Ok(factorization)
    }

    /// Matrix dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Solves `A x = rhs` using the cached factorization.
    pub fn solve(&self, rhs: &[f64], x: &mut [f64]) {
        debug_assert_eq!(rhs.len(), self.dimension);
        debug_assert_eq!(x.len(), self.dimension);
        if self.dimension == 0 {
            return;
        }

        let rhs_mat: Mat<f64> = Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let sol = self.lu.solve(&rhs_mat);
        for (i, xi) in x.iter_mut().enumerate() {
            *xi = sol[(i, 0)];
        }
    }
}

impl std::fmt::Debug for DenseLu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseLu")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}
