//! Solver defaults shared by the parameter layer and the engine.

/// Default Krylov method.
pub const DEFAULT_SOLVER_TYPE: &str = "bicgstab";

/// Default relative residual tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1.0e-8;

/// Default absolute residual tolerance.
pub const DEFAULT_ABS_TOLERANCE: f64 = f64::MIN_POSITIVE;

/// Default Krylov iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default BiCGStab(L) order.
pub const DEFAULT_BICGSTABL_ORDER: usize = 2;

/// Default GMRES restart length.
pub const DEFAULT_GMRES_RESTART: usize = 30;

/// Unknown count below which the hierarchy stops coarsening.
pub const DEFAULT_COARSE_ENOUGH: usize = 3000;

/// Hard cap on hierarchy depth.
pub const DEFAULT_MAX_LEVELS: usize = 25;

/// Strength threshold for aggregation-based coarsening.
pub const DEFAULT_AGGR_EPS_STRONG: f64 = 0.08;

/// Strength threshold for Ruge–Stüben coarsening.
pub const DEFAULT_RS_EPS_STRONG: f64 = 0.25;

/// Damping of the damped Jacobi smoother.
pub const DEFAULT_JACOBI_DAMPING: f64 = 0.72;

/// Coarse operator scaling for plain (unsmoothed) aggregation.
pub const DEFAULT_OVER_INTERP: f64 = 1.5;

/// Pivots smaller than this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1.0e-300;
