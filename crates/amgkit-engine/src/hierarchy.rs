//! AMG hierarchy: setup and V-cycle.
//!
//! Setup coarsens the fine operator until a level has at most
//! `coarse_enough` unknowns, `max_levels` is reached, or the coarsening
//! stops reducing the problem. The coarsest level is factorized with a
//! dense LU when `direct_coarse` is set and it is small enough; otherwise it
//! is smoothed.
//!
//! Applying the hierarchy runs `pre_cycles` V-cycles from a zero initial
//! guess, which makes it a fixed linear operator suitable as a Krylov
//! preconditioner.

use amgkit_sparse::ops::{axpy, residual, spmv};
use amgkit_sparse::{CsrMatrix, DenseLu};
use amgkit_telemetry::{EngineReport, LevelInfo};
use amgkit_types::AmgResult;

use crate::coarsening::coarsen;
use crate::config::AmgConfig;
use crate::relaxation::Smoother;

/// One non-coarsest level with its transfer operators and work vectors.
#[derive(Debug)]
struct Level {
    a: CsrMatrix,
    prolongation: CsrMatrix,
    restriction: CsrMatrix,
    smoother: Smoother,
    tmp: Vec<f64>,
    coarse_rhs: Vec<f64>,
    coarse_x: Vec<f64>,
}

#[derive(Debug)]
enum CoarseSolve {
    Direct(DenseLu),
    Smooth(Smoother),
}

#[derive(Debug)]
struct Coarsest {
    a: CsrMatrix,
    solve: CoarseSolve,
    tmp: Vec<f64>,
}

impl Coarsest {
    fn solve(&mut self, config: &AmgConfig, rhs: &[f64], x: &mut [f64]) {
        match &self.solve {
            CoarseSolve::Direct(lu) => lu.solve(rhs, x),
            CoarseSolve::Smooth(smoother) => {
                for _ in 0..config.npre {
                    smoother.apply_pre(&self.a, rhs, x, &mut self.tmp);
                }
                for _ in 0..config.npost {
                    smoother.apply_post(&self.a, rhs, x, &mut self.tmp);
                }
            }
        }
    }
}

/// Multigrid hierarchy built from a fine-level operator.
#[derive(Debug)]
pub struct AmgHierarchy {
    levels: Vec<Level>,
    coarsest: Coarsest,
    config: AmgConfig,
}

impl AmgHierarchy {
    /// Builds the hierarchy, taking ownership of the fine operator.
    pub fn build(matrix: CsrMatrix, config: &AmgConfig) -> AmgResult<Self> {
        let mut levels = Vec::new();
        let mut a = matrix;

        while a.rows > config.coarse_enough && levels.len() + 1 < config.max_levels {
            let Some(transfer) = coarsen(&a, config) else {
                tracing::debug!(
                    level = levels.len(),
                    unknowns = a.rows,
                    "coarsening stalled"
                );
                break;
            };
            let smoother = Smoother::build(&a, config.relax, config.damping)?;
            let n = a.rows;
            let nc = transfer.coarse.rows;
            tracing::debug!(
                level = levels.len(),
                unknowns = n,
                nonzeros = a.nnz(),
                coarse_unknowns = nc,
                "built level"
            );
            levels.push(Level {
                a,
                prolongation: transfer.prolongation,
                restriction: transfer.restriction,
                smoother,
                tmp: vec![0.0; n],
                coarse_rhs: vec![0.0; nc],
                coarse_x: vec![0.0; nc],
            });
            a = transfer.coarse;
        }

        let direct = config.direct_coarse && a.rows <= config.coarse_enough;
        if config.direct_coarse && !direct {
            tracing::warn!(
                unknowns = a.rows,
                coarse_enough = config.coarse_enough,
                "coarsest level too large for a direct solve; smoothing instead"
            );
        }
        let solve = if direct {
            CoarseSolve::Direct(DenseLu::factorize(&a)?)
        } else {
            CoarseSolve::Smooth(Smoother::build(&a, config.relax, config.damping)?)
        };
        let coarsest = Coarsest {
            tmp: vec![0.0; a.rows],
            a,
            solve,
        };

        Ok(Self {
            levels,
            coarsest,
            config: config.clone(),
        })
    }

    /// Fine-level unknowns.
    pub fn size(&self) -> usize {
        self.fine().rows
    }

    /// Fine-level operator.
    pub fn fine(&self) -> &CsrMatrix {
        self.levels
            .first()
            .map(|l| &l.a)
            .unwrap_or(&self.coarsest.a)
    }

    /// Number of levels including the coarsest.
    pub fn num_levels(&self) -> usize {
        self.levels.len() + 1
    }

    /// Returns true if the coarsest level is solved with a dense LU.
    pub fn is_direct(&self) -> bool {
        matches!(self.coarsest.solve, CoarseSolve::Direct(_))
    }

    /// Level sizes, finest first.
    pub fn level_info(&self) -> Vec<LevelInfo> {
        self.levels
            .iter()
            .map(|l| &l.a)
            .chain(std::iter::once(&self.coarsest.a))
            .map(|a| LevelInfo {
                unknowns: a.rows,
                nonzeros: a.nnz(),
            })
            .collect()
    }

    /// Structural report without a solver section.
    pub fn report(&self, engine: &str) -> EngineReport {
        EngineReport {
            engine: engine.to_string(),
            coarsening: self.config.coarsening.as_str().to_string(),
            relaxation: self.config.relax.as_str().to_string(),
            direct_coarse: self.is_direct(),
            levels: self.level_info(),
            solver: None,
        }
    }

    /// `x = M⁻¹ rhs`: `pre_cycles` V-cycles from a zero guess, or a copy of
    /// `rhs` when `pre_cycles` is zero.
    pub fn apply(&mut self, rhs: &[f64], x: &mut [f64]) {
        if self.config.pre_cycles == 0 {
            x.copy_from_slice(rhs);
            return;
        }
        x.fill(0.0);
        for _ in 0..self.config.pre_cycles {
            cycle(&mut self.levels, &mut self.coarsest, &self.config, rhs, x);
        }
    }
}

fn cycle(
    levels: &mut [Level],
    coarsest: &mut Coarsest,
    config: &AmgConfig,
    rhs: &[f64],
    x: &mut [f64],
) {
    let Some((level, rest)) = levels.split_first_mut() else {
        coarsest.solve(config, rhs, x);
        return;
    };
    let Level {
        a,
        prolongation,
        restriction,
        smoother,
        tmp,
        coarse_rhs,
        coarse_x,
    } = level;

    for _ in 0..config.ncycle {
        for _ in 0..config.npre {
            smoother.apply_pre(a, rhs, x, tmp);
        }

        residual(a, rhs, x, tmp);
        spmv(restriction, tmp, coarse_rhs);
        coarse_x.fill(0.0);
        cycle(rest, coarsest, config, coarse_rhs, coarse_x);
        spmv(prolongation, coarse_x, tmp);
        axpy(1.0, tmp, x);

        for _ in 0..config.npost {
            smoother.apply_post(a, rhs, x, tmp);
        }
    }
}
