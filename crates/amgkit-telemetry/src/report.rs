//! Structural report of a built AMG hierarchy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Size of one hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Unknowns on this level.
    pub unknowns: usize,
    /// Stored entries of the level operator.
    pub nonzeros: usize,
}

/// Krylov method summary (present for solver sessions only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSummary {
    /// Method label, e.g. `BiCGStab(2)`.
    pub method: String,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Relative tolerance.
    pub tolerance: f64,
}

/// What `report()` prints: hierarchy shape plus solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    /// Engine name.
    pub engine: String,
    /// Coarsening strategy.
    pub coarsening: String,
    /// Smoother.
    pub relaxation: String,
    /// Whether the coarsest level is solved directly.
    pub direct_coarse: bool,
    /// Levels, finest first.
    pub levels: Vec<LevelInfo>,
    /// Krylov method, if any.
    pub solver: Option<SolverSummary>,
}

impl EngineReport {
    /// Number of levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Sum of unknowns over all levels divided by fine-level unknowns.
    pub fn grid_complexity(&self) -> f64 {
        ratio(self.levels.iter().map(|l| l.unknowns))
    }

    /// Sum of nonzeros over all levels divided by fine-level nonzeros.
    pub fn operator_complexity(&self) -> f64 {
        ratio(self.levels.iter().map(|l| l.nonzeros))
    }
}

fn ratio(mut sizes: impl Iterator<Item = usize>) -> f64 {
    let Some(first) = sizes.next() else {
        return 0.0;
    };
    if first == 0 {
        return 1.0;
    }
    let total = first + sizes.sum::<usize>();
    total as f64 / first as f64
}

impl fmt::Display for EngineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(solver) = &self.solver {
            writeln!(f, "Solver")?;
            writeln!(f, "======")?;
            writeln!(f, "Type:             {}", solver.method)?;
            writeln!(f, "Max iterations:   {}", solver.max_iterations)?;
            writeln!(f, "Tolerance:        {:.3e}", solver.tolerance)?;
            if let Some(fine) = self.levels.first() {
                writeln!(f, "Unknowns:         {}", fine.unknowns)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Preconditioner")?;
        writeln!(f, "==============")?;
        writeln!(f, "Engine:              {}", self.engine)?;
        writeln!(f, "Coarsening:          {}", self.coarsening)?;
        writeln!(f, "Relaxation:          {}", self.relaxation)?;
        writeln!(f, "Number of levels:    {}", self.num_levels())?;
        writeln!(f, "Operator complexity: {:.2}", self.operator_complexity())?;
        writeln!(f, "Grid complexity:     {:.2}", self.grid_complexity())?;
        writeln!(f)?;
        writeln!(f, "level     unknowns       nonzeros")?;
        writeln!(f, "---------------------------------")?;

        let total_nnz: usize = self.levels.iter().map(|l| l.nonzeros).sum();
        let last = self.levels.len().saturating_sub(1);
        for (depth, level) in self.levels.iter().enumerate() {
            let share = if total_nnz == 0 {
                0.0
            } else {
                100.0 * level.nonzeros as f64 / total_nnz as f64
            };
            write!(
                f,
                "{depth:>5} {:>12} {:>14} ({share:>5.2}%)",
                level.unknowns, level.nonzeros
            )?;
            if depth == last && self.direct_coarse && depth > 0 {
                write!(f, " [direct]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
