//! # amgkit-telemetry
//!
//! Diagnostic output for amgkit. Handles emit structured events
//! (build, structural report, convergence, destroy) that are consumed
//! by pluggable sinks (in-memory, `tracing`, human-readable writer).

pub mod events;
pub mod report;
pub mod sinks;

pub use events::{EventKind, SessionEvent};
pub use report::{EngineReport, LevelInfo, SolverSummary};
pub use sinks::{EventSink, TracingSink, VecSink, WriterSink};
