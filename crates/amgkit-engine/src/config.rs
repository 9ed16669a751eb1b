//! Engine configuration read from a parameter snapshot.
//!
//! Parameter names follow the dotted `solver.*` / `precond.*` convention.
//! Names the engine does not recognize are logged and ignored; recognized
//! names with unusable values fail the build.

use serde::{Deserialize, Serialize};

use amgkit_params::ParamSnapshot;
use amgkit_types::constants::*;
use amgkit_types::{AmgError, AmgResult};

/// Every parameter name the native engine reads.
pub const KNOWN_PARAMETERS: &[&str] = &[
    "solver.type",
    "solver.tol",
    "solver.abstol",
    "solver.maxiter",
    "solver.L",
    "solver.M",
    "precond.coarsening.type",
    "precond.coarsening.aggr.eps_strong",
    "precond.coarsening.eps_strong",
    "precond.coarsening.relax",
    "precond.coarsening.over_interp",
    "precond.relax.type",
    "precond.relax.damping",
    "precond.coarse_enough",
    "precond.direct_coarse",
    "precond.max_levels",
    "precond.npre",
    "precond.npost",
    "precond.ncycle",
    "precond.pre_cycles",
];

/// Coarsening strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseningKind {
    /// Smoothed aggregation (default).
    SmoothedAggregation,
    /// Plain (unsmoothed) aggregation with scaled coarse operators.
    Aggregation,
    /// Classical Ruge–Stüben C/F splitting with direct interpolation.
    RugeStuben,
}

impl CoarseningKind {
    /// Parameter-file spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SmoothedAggregation => "smoothed_aggregation",
            Self::Aggregation => "aggregation",
            Self::RugeStuben => "ruge_stuben",
        }
    }

    fn parse(name: &str, value: &str) -> AmgResult<Self> {
        match value {
            "smoothed_aggregation" => Ok(Self::SmoothedAggregation),
            "aggregation" => Ok(Self::Aggregation),
            "ruge_stuben" => Ok(Self::RugeStuben),
            other => Err(AmgError::parameter(
                name,
                format!("unknown coarsening '{other}'"),
            )),
        }
    }
}

/// Smoother applied on every level but the coarsest direct one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxKind {
    /// Sparse approximate inverse with diagonal pattern (default).
    Spai0,
    /// Damped Jacobi.
    DampedJacobi,
    /// Gauss–Seidel: forward sweep before, backward sweep after coarse correction.
    GaussSeidel,
}

impl RelaxKind {
    /// Parameter-file spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spai0 => "spai0",
            Self::DampedJacobi => "damped_jacobi",
            Self::GaussSeidel => "gauss_seidel",
        }
    }

    fn parse(name: &str, value: &str) -> AmgResult<Self> {
        match value {
            "spai0" => Ok(Self::Spai0),
            "damped_jacobi" => Ok(Self::DampedJacobi),
            "gauss_seidel" => Ok(Self::GaussSeidel),
            other => Err(AmgError::parameter(
                name,
                format!("unknown relaxation '{other}'"),
            )),
        }
    }
}

/// AMG hierarchy settings (`precond.*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmgConfig {
    pub coarsening: CoarseningKind,
    /// Strength threshold for aggregation-based coarsening.
    pub aggr_eps_strong: f64,
    /// Strength threshold for Ruge–Stüben coarsening.
    pub rs_eps_strong: f64,
    /// Prolongation smoothing scale for smoothed aggregation.
    pub sa_relax: f64,
    /// Coarse operator scaling for plain aggregation.
    pub over_interp: f64,
    pub relax: RelaxKind,
    /// Jacobi damping factor.
    pub damping: f64,
    /// Stop coarsening once a level has at most this many unknowns.
    pub coarse_enough: usize,
    /// Factorize the coarsest level instead of smoothing it.
    pub direct_coarse: bool,
    pub max_levels: usize,
    pub npre: usize,
    pub npost: usize,
    /// V-cycles per level visit.
    pub ncycle: usize,
    /// V-cycles per preconditioner application.
    pub pre_cycles: usize,
}

impl Default for AmgConfig {
    fn default() -> Self {
        Self {
            coarsening: CoarseningKind::SmoothedAggregation,
            aggr_eps_strong: DEFAULT_AGGR_EPS_STRONG,
            rs_eps_strong: DEFAULT_RS_EPS_STRONG,
            sa_relax: 1.0,
            over_interp: DEFAULT_OVER_INTERP,
            relax: RelaxKind::Spai0,
            damping: DEFAULT_JACOBI_DAMPING,
            coarse_enough: DEFAULT_COARSE_ENOUGH,
            direct_coarse: true,
            max_levels: DEFAULT_MAX_LEVELS,
            npre: 1,
            npost: 1,
            ncycle: 1,
            pre_cycles: 1,
        }
    }
}

impl AmgConfig {
    /// Reads `precond.*` entries; missing entries take their defaults.
    pub fn from_snapshot(params: &ParamSnapshot) -> AmgResult<Self> {
        let d = Self::default();
        let config = Self {
            coarsening: CoarseningKind::parse(
                "precond.coarsening.type",
                params.str_or("precond.coarsening.type", d.coarsening.as_str())?,
            )?,
            aggr_eps_strong: params.f64_or("precond.coarsening.aggr.eps_strong", d.aggr_eps_strong)?,
            rs_eps_strong: params.f64_or("precond.coarsening.eps_strong", d.rs_eps_strong)?,
            sa_relax: params.f64_or("precond.coarsening.relax", d.sa_relax)?,
            over_interp: params.f64_or("precond.coarsening.over_interp", d.over_interp)?,
            relax: RelaxKind::parse(
                "precond.relax.type",
                params.str_or("precond.relax.type", d.relax.as_str())?,
            )?,
            damping: params.f64_or("precond.relax.damping", d.damping)?,
            coarse_enough: params.usize_or("precond.coarse_enough", d.coarse_enough)?,
            direct_coarse: params.bool_or("precond.direct_coarse", d.direct_coarse)?,
            max_levels: params.usize_or("precond.max_levels", d.max_levels)?,
            npre: params.usize_or("precond.npre", d.npre)?,
            npost: params.usize_or("precond.npost", d.npost)?,
            ncycle: params.usize_or("precond.ncycle", d.ncycle)?,
            pre_cycles: params.usize_or("precond.pre_cycles", d.pre_cycles)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AmgResult<()> {
        if self.aggr_eps_strong < 0.0 {
            return Err(AmgError::parameter("precond.coarsening.aggr.eps_strong", "must be non-negative"));
        }
        if !(0.0..1.0).contains(&self.rs_eps_strong) {
            return Err(AmgError::parameter("precond.coarsening.eps_strong", "must lie in [0, 1)"));
        }
        if self.sa_relax <= 0.0 {
            return Err(AmgError::parameter("precond.coarsening.relax", "must be positive"));
        }
        if self.over_interp <= 0.0 {
            return Err(AmgError::parameter("precond.coarsening.over_interp", "must be positive"));
        }
        if self.damping <= 0.0 || self.damping >= 2.0 {
            return Err(AmgError::parameter("precond.relax.damping", "must lie in (0, 2)"));
        }
        if self.coarse_enough == 0 {
            return Err(AmgError::parameter("precond.coarse_enough", "must be at least 1"));
        }
        if self.max_levels == 0 {
            return Err(AmgError::parameter("precond.max_levels", "must be at least 1"));
        }
        if self.ncycle == 0 {
            return Err(AmgError::parameter("precond.ncycle", "must be at least 1"));
        }
        Ok(())
    }
}

/// Krylov method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KrylovKind {
    /// Preconditioned conjugate gradient (symmetric positive definite systems).
    Cg,
    /// Right-preconditioned BiCGStab (default).
    BiCgStab,
    /// BiCGStab(L) with `L` minimal-residual steps per cycle.
    BiCgStabL,
    /// Restarted right-preconditioned GMRES(M).
    Gmres,
}

impl KrylovKind {
    /// Parameter-file spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cg => "cg",
            Self::BiCgStab => "bicgstab",
            Self::BiCgStabL => "bicgstabl",
            Self::Gmres => "gmres",
        }
    }

    fn parse(name: &str, value: &str) -> AmgResult<Self> {
        match value {
            "cg" => Ok(Self::Cg),
            "bicgstab" => Ok(Self::BiCgStab),
            "bicgstabl" => Ok(Self::BiCgStabL),
            "gmres" => Ok(Self::Gmres),
            other => Err(AmgError::parameter(name, format!("unknown solver '{other}'"))),
        }
    }
}

/// Krylov settings (`solver.*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KrylovConfig {
    pub kind: KrylovKind,
    /// Relative tolerance on ‖b − Ax‖ / ‖b‖.
    pub tol: f64,
    /// Absolute tolerance on ‖b − Ax‖.
    pub abstol: f64,
    pub max_iterations: usize,
    /// BiCGStab(L) order.
    pub order: usize,
    /// GMRES restart length.
    pub restart: usize,
}

impl Default for KrylovConfig {
    fn default() -> Self {
        Self {
            kind: KrylovKind::BiCgStab,
            tol: DEFAULT_TOLERANCE,
            abstol: DEFAULT_ABS_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            order: DEFAULT_BICGSTABL_ORDER,
            restart: DEFAULT_GMRES_RESTART,
        }
    }
}

impl KrylovConfig {
    /// Reads `solver.*` entries; missing entries take their defaults.
    pub fn from_snapshot(params: &ParamSnapshot) -> AmgResult<Self> {
        let d = Self::default();
        let config = Self {
            kind: KrylovKind::parse("solver.type", params.str_or("solver.type", DEFAULT_SOLVER_TYPE)?)?,
            tol: params.f64_or("solver.tol", d.tol)?,
            abstol: params.f64_or("solver.abstol", d.abstol)?,
            max_iterations: params.usize_or("solver.maxiter", d.max_iterations)?,
            order: params.usize_or("solver.L", d.order)?,
            restart: params.usize_or("solver.M", d.restart)?,
        };
        if config.tol < 0.0 {
            return Err(AmgError::parameter("solver.tol", "must be non-negative"));
        }
        if config.abstol < 0.0 {
            return Err(AmgError::parameter("solver.abstol", "must be non-negative"));
        }
        if config.order == 0 {
            return Err(AmgError::parameter("solver.L", "must be at least 1"));
        }
        if config.restart == 0 {
            return Err(AmgError::parameter("solver.M", "must be at least 1"));
        }
        Ok(config)
    }

    /// Absolute stopping threshold for a right-hand side of norm `norm_rhs`.
    pub fn threshold(&self, norm_rhs: f64) -> f64 {
        (self.tol * norm_rhs).max(self.abstol)
    }
}

/// Logs every snapshot entry the engine does not read.
pub fn warn_unknown(params: &ParamSnapshot) {
    for name in params.unknown(KNOWN_PARAMETERS) {
        tracing::warn!(parameter = name, "ignoring unrecognized parameter");
    }
}
