//! Session event types.
//!
//! Structured events emitted by preconditioner and solver handles.
//! Events are lightweight value types that carry just enough data to be
//! useful for monitoring and debugging.

use amgkit_types::ConvergenceInfo;
use serde::{Deserialize, Serialize};

use crate::report::EngineReport;

/// An event emitted by a handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Which kind of handle produced the event ("preconditioner", "solver session").
    pub source: String,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// A handle finished building.
    Built {
        /// Engine name.
        engine: String,
        /// Number of unknowns.
        unknowns: usize,
        /// Number of stored matrix entries.
        nonzeros: usize,
        /// Setup wall-clock time (seconds).
        setup_time: f64,
    },

    /// Structural description of the built hierarchy.
    Report(EngineReport),

    /// A solve call finished.
    Convergence(ConvergenceInfo),

    /// A handle released its resources.
    Destroyed,
}

impl SessionEvent {
    /// Creates a new event for the given source.
    pub fn new(source: impl Into<String>, kind: EventKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }
}
