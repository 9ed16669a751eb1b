//! Coarsening: builds transfer operators and the Galerkin coarse operator.
//!
//! Three strategies are available, selected by [`CoarseningKind`]:
//!
//! - **Aggregation**: strongly connected neighbourhoods are grouped into
//!   aggregates; the tentative prolongation injects the constant vector of
//!   each aggregate. The coarse operator is scaled by `1 / over_interp`.
//! - **Smoothed aggregation**: the tentative prolongation is smoothed with
//!   one damped Jacobi step on the filtered matrix,
//!   `P = (I − ω D_f⁻¹ A_f) P_tent` with `ω = 2/3 · relax`.
//! - **Ruge–Stüben**: classical C/F splitting on negative couplings with
//!   direct interpolation.
//!
//! In every case `R = Pᵀ` and `A_c = R A P`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use amgkit_sparse::ops::{product, transpose};
use amgkit_sparse::CsrMatrix;

use crate::config::{AmgConfig, CoarseningKind};

/// Operators linking a level to the next coarser one.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Coarse → fine interpolation (`n × n_c`).
    pub prolongation: CsrMatrix,
    /// Fine → coarse restriction (`n_c × n`).
    pub restriction: CsrMatrix,
    /// Galerkin coarse operator (`n_c × n_c`).
    pub coarse: CsrMatrix,
}

/// Builds the transfer operators for `a`.
///
/// Returns `None` when the strategy cannot reduce the problem (no strong
/// connections, or a coarse level that is not smaller than `a`).
pub fn coarsen(a: &CsrMatrix, config: &AmgConfig) -> Option<Transfer> {
    let (prolongation, scale) = match config.coarsening {
        CoarseningKind::Aggregation => {
            let strong = aggregation_strength(a, config.aggr_eps_strong);
            let aggregates = Aggregates::build(a, &strong);
            (aggregates.tentative(), 1.0 / config.over_interp)
        }
        CoarseningKind::SmoothedAggregation => {
            let strong = aggregation_strength(a, config.aggr_eps_strong);
            let aggregates = Aggregates::build(a, &strong);
            let omega = config.sa_relax * 2.0 / 3.0;
            (smoothed_prolongation(a, &strong, &aggregates, omega), 1.0)
        }
        CoarseningKind::RugeStuben => {
            let strong = ruge_stuben_strength(a, config.rs_eps_strong);
            let split = CfSplit::build(a, &strong);
            (split.direct_interpolation(a, &strong), 1.0)
        }
    };

    let nc = prolongation.cols;
    if nc == 0 || nc >= a.rows {
        return None;
    }

    let restriction = transpose(&prolongation);
    let mut coarse = product(&restriction, &product(a, &prolongation));
    if scale != 1.0 {
        coarse.values.iter_mut().for_each(|v| *v *= scale);
    }

    Some(Transfer {
        prolongation,
        restriction,
        coarse,
    })
}

// ─── Aggregation ─────────────────────────────────────────────

/// Strong-connection mask parallel to `a.col_idx`:
/// `a_ij² > ε² |a_ii a_jj|` for off-diagonal entries.
pub fn aggregation_strength(a: &CsrMatrix, eps_strong: f64) -> Vec<bool> {
    let diag = a.diagonal();
    let eps2 = eps_strong * eps_strong;
    let mut strong = vec![false; a.nnz()];
    for i in 0..a.rows {
        for k in a.row_ptr[i]..a.row_ptr[i + 1] {
            let j = a.col_idx[k];
            let v = a.values[k];
            strong[k] = j != i && v * v > eps2 * (diag[i] * diag[j]).abs();
        }
    }
    strong
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Undecided,
    /// No strong connections; left out of every aggregate.
    Isolated,
    Member(usize),
}

/// Assignment of fine unknowns to aggregates.
#[derive(Debug, Clone)]
pub struct Aggregates {
    /// Number of non-empty aggregates.
    pub count: usize,
    /// Aggregate of each unknown; `None` for isolated unknowns.
    pub id: Vec<Option<usize>>,
}

impl Aggregates {
    /// Greedy aggregation: every undecided unknown seeds an aggregate that
    /// claims its strong neighbours, then tentatively their undecided
    /// strong neighbours.
    pub fn build(a: &CsrMatrix, strong: &[bool]) -> Self {
        let n = a.rows;
        let mut mark: Vec<Mark> = (0..n)
            .map(|i| {
                if (a.row_ptr[i]..a.row_ptr[i + 1]).any(|k| strong[k]) {
                    Mark::Undecided
                } else {
                    Mark::Isolated
                }
            })
            .collect();

        let mut count = 0usize;
        let mut neighbours = Vec::new();
        for i in 0..n {
            if mark[i] != Mark::Undecided {
                continue;
            }
            let current = count;
            count += 1;
            mark[i] = Mark::Member(current);

            neighbours.clear();
            for k in a.row_ptr[i]..a.row_ptr[i + 1] {
                let j = a.col_idx[k];
                if strong[k] && mark[j] != Mark::Isolated {
                    mark[j] = Mark::Member(current);
                    neighbours.push(j);
                }
            }
            for &j in &neighbours {
                for k in a.row_ptr[j]..a.row_ptr[j + 1] {
                    let c = a.col_idx[k];
                    if strong[k] && mark[c] == Mark::Undecided {
                        mark[c] = Mark::Member(current);
                    }
                }
            }
        }

        // Later seeds may empty an earlier aggregate; renumber densely.
        let mut used = vec![false; count];
        for m in &mark {
            if let Mark::Member(g) = *m {
                used[g] = true;
            }
        }
        let mut renumber = vec![0usize; count];
        let mut next = 0usize;
        for (g, slot) in renumber.iter_mut().enumerate() {
            *slot = next;
            if used[g] {
                next += 1;
            }
        }

        let id = mark
            .iter()
            .map(|m| match *m {
                Mark::Member(g) => Some(renumber[g]),
                _ => None,
            })
            .collect();

        Self { count: next, id }
    }

    /// Piecewise-constant prolongation (`n × count`).
    pub fn tentative(&self) -> CsrMatrix {
        let mut row_ptr = Vec::with_capacity(self.id.len() + 1);
        let mut col_idx = Vec::with_capacity(self.id.len());
        row_ptr.push(0);
        for id in &self.id {
            if let Some(g) = *id {
                col_idx.push(g);
            }
            row_ptr.push(col_idx.len());
        }
        let values = vec![1.0; col_idx.len()];
        CsrMatrix {
            rows: self.id.len(),
            cols: self.count,
            row_ptr,
            col_idx,
            values,
        }
    }
}

/// `P = (I − ω D_f⁻¹ A_f) P_tent`, where `A_f` keeps strong couplings and
/// lumps weak ones into the diagonal.
fn smoothed_prolongation(a: &CsrMatrix, strong: &[bool], aggregates: &Aggregates, omega: f64) -> CsrMatrix {
    let n = a.rows;
    let nc = aggregates.count;
    let mut marker = vec![usize::MAX; nc];
    let mut accum = vec![0.0f64; nc];
    let mut row_cols: Vec<usize> = Vec::new();

    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();
    row_ptr.push(0);

    for i in 0..n {
        row_cols.clear();
        let mut add = |g: usize, v: f64, row_cols: &mut Vec<usize>| {
            if marker[g] != i {
                marker[g] = i;
                accum[g] = 0.0;
                row_cols.push(g);
            }
            accum[g] += v;
        };

        let range = a.row_ptr[i]..a.row_ptr[i + 1];
        let filtered_diag: f64 = range
            .clone()
            .filter(|&k| a.col_idx[k] == i || !strong[k])
            .map(|k| a.values[k])
            .sum();

        if filtered_diag == 0.0 {
            if let Some(g) = aggregates.id[i] {
                add(g, 1.0, &mut row_cols);
            }
        } else {
            if let Some(g) = aggregates.id[i] {
                add(g, 1.0 - omega, &mut row_cols);
            }
            let scale = -omega / filtered_diag;
            for k in range {
                if !strong[k] {
                    continue;
                }
                if let Some(g) = aggregates.id[a.col_idx[k]] {
                    add(g, scale * a.values[k], &mut row_cols);
                }
            }
        }

        row_cols.sort_unstable();
        for &g in &row_cols {
            col_idx.push(g);
            values.push(accum[g]);
        }
        row_ptr.push(col_idx.len());
    }

    CsrMatrix {
        rows: n,
        cols: nc,
        row_ptr,
        col_idx,
        values,
    }
}

// ─── Ruge–Stüben ─────────────────────────────────────────────

/// Strong-dependence mask parallel to `a.col_idx`:
/// `−a_ij ≥ θ · max_{k≠i} (−a_ik)` for negative off-diagonal entries.
pub fn ruge_stuben_strength(a: &CsrMatrix, theta: f64) -> Vec<bool> {
    let mut strong = vec![false; a.nnz()];
    for i in 0..a.rows {
        let range = a.row_ptr[i]..a.row_ptr[i + 1];
        let max_neg = range
            .clone()
            .filter(|&k| a.col_idx[k] != i)
            .map(|k| -a.values[k])
            .fold(0.0f64, f64::max);
        if max_neg <= 0.0 {
            continue;
        }
        let threshold = theta * max_neg;
        for k in range {
            let v = -a.values[k];
            strong[k] = a.col_idx[k] != i && v > 0.0 && v >= threshold;
        }
    }
    strong
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Point {
    Undecided,
    Coarse,
    Fine,
}

/// Classical C/F splitting.
#[derive(Debug, Clone)]
pub struct CfSplit {
    /// Coarse index of each C point; `None` for F points.
    pub coarse_index: Vec<Option<usize>>,
    /// Number of C points.
    pub num_coarse: usize,
}

impl CfSplit {
    /// Greedy first pass: repeatedly promote the undecided point that the
    /// most undecided points strongly depend on, and demote its dependents
    /// to F.
    pub fn build(a: &CsrMatrix, strong: &[bool]) -> Self {
        let n = a.rows;

        // Transposed strength pattern: dependents[i] = { j : i ∈ S_j }.
        let mut dep_ptr = vec![0usize; n + 1];
        for i in 0..n {
            for k in a.row_ptr[i]..a.row_ptr[i + 1] {
                if strong[k] {
                    dep_ptr[a.col_idx[k] + 1] += 1;
                }
            }
        }
        for i in 0..n {
            dep_ptr[i + 1] += dep_ptr[i];
        }
        let mut dependents = vec![0usize; dep_ptr[n]];
        let mut cursor = dep_ptr[..n].to_vec();
        for i in 0..n {
            for k in a.row_ptr[i]..a.row_ptr[i + 1] {
                if strong[k] {
                    let j = a.col_idx[k];
                    dependents[cursor[j]] = i;
                    cursor[j] += 1;
                }
            }
        }

        let mut lambda: Vec<usize> = (0..n).map(|i| dep_ptr[i + 1] - dep_ptr[i]).collect();
        let mut point = vec![Point::Undecided; n];
        let mut heap: BinaryHeap<(usize, Reverse<usize>)> =
            (0..n).map(|i| (lambda[i], Reverse(i))).collect();

        while let Some((weight, Reverse(i))) = heap.pop() {
            if point[i] != Point::Undecided || weight != lambda[i] {
                continue;
            }
            point[i] = Point::Coarse;

            for &j in &dependents[dep_ptr[i]..dep_ptr[i + 1]] {
                if point[j] != Point::Undecided {
                    continue;
                }
                point[j] = Point::Fine;
                for k in a.row_ptr[j]..a.row_ptr[j + 1] {
                    let m = a.col_idx[k];
                    if strong[k] && point[m] == Point::Undecided {
                        lambda[m] += 1;
                        heap.push((lambda[m], Reverse(m)));
                    }
                }
            }
            for k in a.row_ptr[i]..a.row_ptr[i + 1] {
                let m = a.col_idx[k];
                if strong[k] && point[m] == Point::Undecided && lambda[m] > 0 {
                    lambda[m] -= 1;
                    heap.push((lambda[m], Reverse(m)));
                }
            }
        }

        let mut num_coarse = 0usize;
        let coarse_index = point
            .iter()
            .map(|p| {
                (*p == Point::Coarse).then(|| {
                    num_coarse += 1;
                    num_coarse - 1
                })
            })
            .collect();

        Self {
            coarse_index,
            num_coarse,
        }
    }

    /// Direct interpolation from strongly coupled C points. Positive and
    /// negative couplings are scaled separately; positive couplings with no
    /// positive C counterpart are lumped into the diagonal.
    pub fn direct_interpolation(&self, a: &CsrMatrix, strong: &[bool]) -> CsrMatrix {
        let n = a.rows;
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for i in 0..n {
            if let Some(c) = self.coarse_index[i] {
                col_idx.push(c);
                values.push(1.0);
                row_ptr.push(col_idx.len());
                continue;
            }

            let range = a.row_ptr[i]..a.row_ptr[i + 1];
            let mut diag = 0.0;
            let (mut neg_all, mut pos_all, mut neg_c, mut pos_c) = (0.0, 0.0, 0.0, 0.0);
            for k in range.clone() {
                let j = a.col_idx[k];
                let v = a.values[k];
                if j == i {
                    diag += v;
                    continue;
                }
                let interpolatory = strong[k] && self.coarse_index[j].is_some();
                if v < 0.0 {
                    neg_all += v;
                    if interpolatory {
                        neg_c += v;
                    }
                } else {
                    pos_all += v;
                    if interpolatory {
                        pos_c += v;
                    }
                }
            }

            let alpha = if neg_c != 0.0 { neg_all / neg_c } else { 0.0 };
            let beta = if pos_c != 0.0 {
                pos_all / pos_c
            } else {
                diag += pos_all;
                0.0
            };

            if diag != 0.0 {
                for k in range {
                    let j = a.col_idx[k];
                    let Some(c) = self.coarse_index[j] else { continue };
                    if j == i || !strong[k] {
                        continue;
                    }
                    let v = a.values[k];
                    let scale = if v < 0.0 { alpha } else { beta };
                    col_idx.push(c);
                    values.push(-scale * v / diag);
                }
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            rows: n,
            cols: self.num_coarse,
            row_ptr,
            col_idx,
            values,
        }
    }
}
