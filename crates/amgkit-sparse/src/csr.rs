//! Compressed sparse row storage.
//!
//! Two flavors share the same struct-of-arrays layout:
//! `row_ptr` (length `n + 1`, starts at 0, non-decreasing, ends at `nnz`),
//! `col_idx` and `values` (length `nnz`, zero-based column indices).
//!
//! [`CsrView`] borrows caller arrays for the duration of one call;
//! [`CsrMatrix`] owns its arrays and is what the engine keeps.

use amgkit_types::{AmgError, AmgResult};
use serde::{Deserialize, Serialize};

/// Borrowed, read-only CSR description of a square `n × n` matrix.
#[derive(Debug, Clone, Copy)]
pub struct CsrView<'a> {
    /// Number of rows (and columns).
    pub n: usize,
    /// Row pointer array (length `n + 1`).
    pub row_ptr: &'a [usize],
    /// Column index of each stored entry.
    pub col_idx: &'a [usize],
    /// Value of each stored entry.
    pub values: &'a [f64],
}

impl<'a> CsrView<'a> {
    /// Wraps caller arrays without checking them. Use [`CsrView::validate`]
    /// before handing the view to code that indexes through it.
    pub fn new(n: usize, row_ptr: &'a [usize], col_idx: &'a [usize], values: &'a [f64]) -> Self {
        Self {
            n,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of stored entries as declared by the row pointer.
    pub fn nnz(&self) -> usize {
        self.row_ptr.last().copied().unwrap_or(0)
    }

    /// Checks the structural CSR invariants.
    pub fn validate(&self) -> AmgResult<()> {
        if self.row_ptr.len() != self.n + 1 {
            return Err(AmgError::InvalidMatrix(format!(
                "row pointer length ({}) != n + 1 ({})",
                self.row_ptr.len(),
                self.n + 1
            )));
        }
        if self.row_ptr[0] != 0 {
            return Err(AmgError::InvalidMatrix(format!(
                "row pointer must start at 0, got {}",
                self.row_ptr[0]
            )));
        }
        if let Some(row) = self.row_ptr.windows(2).position(|w| w[1] < w[0]) {
            return Err(AmgError::InvalidMatrix(format!(
                "row pointer decreases at row {row}"
            )));
        }
        let nnz = self.nnz();
        if self.col_idx.len() != nnz {
            return Err(AmgError::InvalidMatrix(format!(
                "column index length ({}) != nnz ({nnz})",
                self.col_idx.len()
            )));
        }
        if self.values.len() != nnz {
            return Err(AmgError::InvalidMatrix(format!(
                "value length ({}) != nnz ({nnz})",
                self.values.len()
            )));
        }
        if let Some(pos) = self.col_idx.iter().position(|&c| c >= self.n) {
            return Err(AmgError::InvalidMatrix(format!(
                "column index {} at position {pos} out of range [0, {})",
                self.col_idx[pos], self.n
            )));
        }
        Ok(())
    }

    /// Deep copy into an owned matrix. Validates first.
    pub fn to_matrix(&self) -> AmgResult<CsrMatrix> {
        self.validate()?;
        Ok(CsrMatrix {
            rows: self.n,
            cols: self.n,
            row_ptr: self.row_ptr.to_vec(),
            col_idx: self.col_idx.to_vec(),
            values: self.values.to_vec(),
        })
    }
}

/// Owned compressed sparse row matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates the `n × n` identity.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Returns the number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Borrowed view of a square matrix.
    pub fn view(&self) -> CsrView<'_> {
        CsrView::new(self.rows, &self.row_ptr, &self.col_idx, &self.values)
    }

    /// Column indices and values of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[range.clone()], &self.values[range])
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Columns within each row are sorted and duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut row_counts = vec![0usize; rows];
        for &(r, _, _) in triplets {
            row_counts[r] += 1;
        }

        let mut row_start = vec![0usize; rows + 1];
        for i in 0..rows {
            row_start[i + 1] = row_start[i] + row_counts[i];
        }

        let mut entries = vec![(0usize, 0.0f64); triplets.len()];
        let mut cursor = row_start[..rows].to_vec();
        for &(r, c, v) in triplets {
            entries[cursor[r]] = (c, v);
            cursor[r] += 1;
        }

        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        row_ptr.push(0);

        for i in 0..rows {
            let slice = &mut entries[row_start[i]..row_start[i + 1]];
            slice.sort_by_key(|&(c, _)| c);
            let mut last: Option<usize> = None;
            for &(c, v) in slice.iter() {
                if last == Some(c) {
                    if let Some(tail) = values.last_mut() {
                        *tail += v;
                    }
                } else {
                    col_idx.push(c);
                    values.push(v);
                    last = Some(c);
                }
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Diagonal entries (zero where a row stores no diagonal).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|i| {
                let (cols, vals) = self.row(i);
                cols.iter()
                    .zip(vals)
                    .filter(|(&c, _)| c == i)
                    .map(|(_, &v)| v)
                    .sum::<f64>()
            })
            .collect()
    }

    /// Replaces the coefficients of a matrix with the same sparsity pattern.
    pub fn update_values(&mut self, values: &[f64]) -> AmgResult<()> {
        if values.len() != self.values.len() {
            return Err(AmgError::DimensionMismatch {
                what: "matrix values",
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }

    /// Returns true if `other` stores entries at exactly the same positions.
    pub fn same_pattern(&self, other: &CsrView<'_>) -> bool {
        self.rows == other.n && self.row_ptr == other.row_ptr && self.col_idx == other.col_idx
    }
}
