//! # amgkit-sparse
//!
//! Sparse linear algebra primitives for amgkit.
//!
//! Provides:
//! - [`CsrView`] — borrowed compressed sparse row description supplied by callers
//! - [`CsrMatrix`] — owned CSR matrix used inside the engine
//! - Sparse kernels (matrix-vector, transpose, sparse product) and vector helpers
//! - Dense LU for the coarsest multigrid level, backed by `faer`
//! - Sample problem generators (3-D Poisson)

pub mod csr;
pub mod dense;
pub mod generators;
pub mod ops;

pub use csr::{CsrMatrix, CsrView};
pub use dense::DenseLu;
