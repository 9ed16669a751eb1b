//! # amgkit-engine
//!
//! The linear algebra engine behind amgkit handles.
//!
//! ## Key Types
//!
//! - [`Engine`] — builds preconditioner and solver backends from a CSR view and a
//!   parameter snapshot
//! - [`PrecondBackend`] / [`SolverBackend`] — the operations a built object exposes
//! - [`NativeEngine`] — pure-Rust implementation: aggregation / smoothed aggregation /
//!   Ruge–Stüben AMG, SPAI-0 / Jacobi / Gauss–Seidel smoothing, CG / BiCGStab /
//!   BiCGStab(L) / GMRES
//! - [`AmgHierarchy`] — the multigrid hierarchy and V-cycle

pub mod coarsening;
pub mod config;
pub mod hierarchy;
pub mod krylov;
pub mod native;
pub mod relaxation;
pub mod traits;

pub use config::{AmgConfig, CoarseningKind, KrylovConfig, KrylovKind, RelaxKind};
pub use hierarchy::AmgHierarchy;
pub use native::NativeEngine;
pub use traits::{Engine, PrecondBackend, SolverBackend};
