//! Sparse kernels and dense vector helpers.
//!
//! All kernels write into caller-provided buffers; nothing here allocates
//! except the matrix-producing operations ([`transpose`], [`product`]).

use crate::csr::CsrMatrix;

/// Sparse matrix-vector product: `y = A x`.
pub fn spmv(a: &CsrMatrix, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(a.cols, x.len());
    debug_assert_eq!(a.rows, y.len());

    for (i, yi) in y.iter_mut().enumerate() {
        let (cols, vals) = a.row(i);
        *yi = cols.iter().zip(vals).map(|(&c, &v)| v * x[c]).sum();
    }
}

/// Residual: `r = b − A x`.
pub fn residual(a: &CsrMatrix, b: &[f64], x: &[f64], r: &mut [f64]) {
    debug_assert_eq!(a.rows, b.len());
    debug_assert_eq!(a.rows, r.len());

    for (i, ri) in r.iter_mut().enumerate() {
        let (cols, vals) = a.row(i);
        let ax: f64 = cols.iter().zip(vals).map(|(&c, &v)| v * x[c]).sum();
        *ri = b[i] - ax;
    }
}

/// Transpose, keeping columns sorted within each output row.
pub fn transpose(a: &CsrMatrix) -> CsrMatrix {
    let mut counts = vec![0usize; a.cols + 1];
    for &c in &a.col_idx {
        counts[c + 1] += 1;
    }
    for j in 0..a.cols {
        counts[j + 1] += counts[j];
    }
    let row_ptr = counts.clone();

    let nnz = a.nnz();
    let mut col_idx = vec![0usize; nnz];
    let mut values = vec![0.0f64; nnz];
    let mut cursor = counts;

    for i in 0..a.rows {
        let (cols, vals) = a.row(i);
        for (&c, &v) in cols.iter().zip(vals) {
            let pos = cursor[c];
            col_idx[pos] = i;
            values[pos] = v;
            cursor[c] += 1;
        }
    }

    CsrMatrix {
        rows: a.cols,
        cols: a.rows,
        row_ptr,
        col_idx,
        values,
    }
}

/// Sparse product `A · B` (row-by-row accumulation with a dense marker).
pub fn product(a: &CsrMatrix, b: &CsrMatrix) -> CsrMatrix {
    assert_eq!(a.cols, b.rows, "inner dimensions must agree");

    let mut marker = vec![usize::MAX; b.cols];
    let mut accum = vec![0.0f64; b.cols];
    let mut row_cols: Vec<usize> = Vec::new();

    let mut row_ptr = Vec::with_capacity(a.rows + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();
    row_ptr.push(0);

    for i in 0..a.rows {
        row_cols.clear();
        let (a_cols, a_vals) = a.row(i);
        for (&k, &a_ik) in a_cols.iter().zip(a_vals) {
            let (b_cols, b_vals) = b.row(k);
            for (&j, &b_kj) in b_cols.iter().zip(b_vals) {
                if marker[j] != i {
                    marker[j] = i;
                    accum[j] = 0.0;
                    row_cols.push(j);
                }
                accum[j] += a_ik * b_kj;
            }
        }
        row_cols.sort_unstable();
        for &j in &row_cols {
            col_idx.push(j);
            values.push(accum[j]);
        }
        row_ptr.push(col_idx.len());
    }

    CsrMatrix {
        rows: a.rows,
        cols: b.cols,
        row_ptr,
        col_idx,
        values,
    }
}

/// Inner product.
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Euclidean norm.
#[inline]
pub fn norm(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// `y += alpha · x`
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// `y = alpha · x + beta · y`
#[inline]
pub fn axpby(alpha: f64, x: &[f64], beta: f64, y: &mut [f64]) {
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = alpha * xi + beta * *yi;
    }
}
