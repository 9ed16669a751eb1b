//! Smoothers applied before and after each coarse-grid correction.

use amgkit_sparse::ops::residual;
use amgkit_sparse::CsrMatrix;
use amgkit_types::{AmgError, AmgResult};

use crate::config::RelaxKind;

/// A smoother bound to one level's operator.
#[derive(Debug, Clone)]
pub enum Smoother {
    /// `x += M (f − A x)` with `m_i = a_ii / Σ_j a_ij²`.
    Spai0 { m: Vec<f64> },
    /// `x += ω D⁻¹ (f − A x)`.
    DampedJacobi { inv_diag: Vec<f64>, damping: f64 },
    /// Forward sweep before, backward sweep after coarse correction.
    GaussSeidel { inv_diag: Vec<f64> },
}

impl Smoother {
    /// Builds the smoother for `a`.
    ///
    /// Jacobi and Gauss–Seidel reject rows with a zero diagonal.
    pub fn build(a: &CsrMatrix, kind: RelaxKind, damping: f64) -> AmgResult<Self> {
        match kind {
            RelaxKind::Spai0 => {
                let m = (0..a.rows)
                    .map(|i| {
                        let (cols, vals) = a.row(i);
                        let mut diag = 0.0;
                        let mut norm2 = 0.0;
                        for (&j, &v) in cols.iter().zip(vals) {
                            if j == i {
                                diag += v;
                            }
                            norm2 += v * v;
                        }
                        if norm2 > 0.0 {
                            diag / norm2
                        } else {
                            0.0
                        }
                    })
                    .collect();
                Ok(Self::Spai0 { m })
            }
            RelaxKind::DampedJacobi => Ok(Self::DampedJacobi {
                inv_diag: inverted_diagonal(a)?,
                damping,
            }),
            RelaxKind::GaussSeidel => Ok(Self::GaussSeidel {
                inv_diag: inverted_diagonal(a)?,
            }),
        }
    }

    /// Pre-smoothing step.
    pub fn apply_pre(&self, a: &CsrMatrix, rhs: &[f64], x: &mut [f64], tmp: &mut [f64]) {
        match self {
            Self::GaussSeidel { inv_diag } => gauss_seidel_sweep(a, inv_diag, rhs, x, 0..a.rows),
            _ => self.apply_diagonal(a, rhs, x, tmp),
        }
    }

    /// Post-smoothing step.
    pub fn apply_post(&self, a: &CsrMatrix, rhs: &[f64], x: &mut [f64], tmp: &mut [f64]) {
        match self {
            Self::GaussSeidel { inv_diag } => {
                gauss_seidel_sweep(a, inv_diag, rhs, x, (0..a.rows).rev())
            }
            _ => self.apply_diagonal(a, rhs, x, tmp),
        }
    }

    fn apply_diagonal(&self, a: &CsrMatrix, rhs: &[f64], x: &mut [f64], tmp: &mut [f64]) {
        residual(a, rhs, x, tmp);
        match self {
            Self::Spai0 { m } => {
                for ((xi, &ri), &mi) in x.iter_mut().zip(tmp.iter()).zip(m) {
                    *xi += mi * ri;
                }
            }
            Self::DampedJacobi { inv_diag, damping } => {
                for ((xi, &ri), &di) in x.iter_mut().zip(tmp.iter()).zip(inv_diag) {
                    *xi += damping * di * ri;
                }
            }
            Self::GaussSeidel { .. } => {}
        }
    }
}

fn inverted_diagonal(a: &CsrMatrix) -> AmgResult<Vec<f64>> {
    a.diagonal()
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            if d == 0.0 {
                Err(AmgError::InvalidMatrix(format!("zero diagonal in row {i}")))
            } else {
                Ok(1.0 / d)
            }
        })
        .collect()
}

fn gauss_seidel_sweep(
    a: &CsrMatrix,
    inv_diag: &[f64],
    rhs: &[f64],
    x: &mut [f64],
    rows: impl Iterator<Item = usize>,
) {
    for i in rows {
        let (cols, vals) = a.row(i);
        let mut s = rhs[i];
        for (&j, &v) in cols.iter().zip(vals) {
            if j != i {
                s -= v * x[j];
            }
        }
        x[i] = s * inv_diag[i];
    }
}
