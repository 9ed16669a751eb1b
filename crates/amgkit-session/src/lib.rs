//! # amgkit-session
//!
//! Handle-typed objects for AMG-preconditioned Krylov solves.
//!
//! ## Key Types
//!
//! - [`Preconditioner`] — a built AMG hierarchy exposing `apply`
//! - [`SolverSession`] — a Krylov solver bound to one matrix, with its own
//!   AMG preconditioner
//!
//! Both follow `Uncreated → Live → Destroyed`. A build copies the parameter
//! store, so the store may be changed or destroyed right afterwards.
//!
//! ```
//! use amgkit_session::{ParameterStore, SolverSession};
//! use amgkit_sparse::generators::poisson3d;
//!
//! let problem = poisson3d(4, 1.0);
//! let mut params = ParameterStore::created();
//! params.set_string("solver.type", "bicgstabl").unwrap();
//!
//! let mut solver = SolverSession::new();
//! solver.build(problem.matrix.view(), &params).unwrap();
//! params.destroy().unwrap();
//!
//! let mut x = vec![0.0; problem.size()];
//! let info = solver.solve(&problem.rhs, &mut x).unwrap();
//! assert!(info.converged);
//! solver.destroy().unwrap();
//! ```

mod handle;
pub mod precond;
pub mod solver;

pub use precond::Preconditioner;
pub use solver::SolverSession;

pub use amgkit_engine::{Engine, NativeEngine};
pub use amgkit_params::ParameterStore;
pub use amgkit_sparse::CsrView;
pub use amgkit_types::{AmgError, AmgResult, ConvergenceInfo, Phase};
