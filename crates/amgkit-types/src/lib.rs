//! # amgkit-types
//!
//! Shared types, error types, and solver defaults for the amgkit
//! AMG-preconditioned Krylov solver.
//!
//! This crate has zero numerical logic — it defines the vocabulary
//! that all other amgkit crates share.

pub mod constants;
pub mod convergence;
pub mod error;
pub mod state;

pub use convergence::ConvergenceInfo;
pub use error::{AmgError, AmgResult};
pub use state::{HandleState, Phase};
