//! Standalone AMG preconditioner handle.

use std::fmt;
use std::time::Instant;

use amgkit_engine::{Engine, NativeEngine, PrecondBackend};
use amgkit_params::ParameterStore;
use amgkit_sparse::CsrView;
use amgkit_telemetry::{EngineReport, EventKind, EventSink, SessionEvent};
use amgkit_types::{AmgError, AmgResult, HandleState, Phase};

use crate::handle::{check_len, Built, Observer};

const OBJECT: &str = "preconditioner";

/// An AMG hierarchy built from one matrix.
///
/// `apply` computes a single approximate inverse action; it does not
/// iterate and produces no convergence information.
#[derive(Default)]
pub struct Preconditioner {
    state: HandleState<Built<dyn PrecondBackend>>,
    observer: Observer,
}

impl Preconditioner {
    /// Creates an unbuilt handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and builds a handle with the native engine.
    pub fn from_matrix(matrix: CsrView<'_>, params: &ParameterStore) -> AmgResult<Self> {
        let mut precond = Self::new();
        precond.build(matrix, params)?;
        Ok(precond)
    }

    /// Builds with the native engine. See [`Preconditioner::build_with`].
    pub fn build(&mut self, matrix: CsrView<'_>, params: &ParameterStore) -> AmgResult<()> {
        self.build_with(&NativeEngine, matrix, params)
    }

    /// Builds the hierarchy, moving `Uncreated → Live`.
    ///
    /// `params` must be live; its entries are copied before the engine is
    /// invoked. On any failure the handle stays `Uncreated`.
    pub fn build_with(
        &mut self,
        engine: &dyn Engine,
        matrix: CsrView<'_>,
        params: &ParameterStore,
    ) -> AmgResult<()> {
        self.state.ensure_uncreated(OBJECT, "build")?;
        let snapshot = params.snapshot()?;

        let start = Instant::now();
        let backend = engine
            .create_precond(matrix, &snapshot)
            .map_err(AmgError::into_construction)?;
        let built = Built {
            unknowns: backend.size(),
            nonzeros: backend.nonzeros(),
            engine: engine.name().to_string(),
            setup_time: start.elapsed(),
            backend,
        };

        tracing::debug!(
            engine = %built.engine,
            unknowns = built.unknowns,
            nonzeros = built.nonzeros,
            "preconditioner built"
        );
        self.observer.emit(OBJECT, built.built_event());
        self.state.activate(built, OBJECT, "build")
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Number of unknowns fixed at build time.
    pub fn size(&self) -> AmgResult<usize> {
        Ok(self.state.live(OBJECT, "query")?.unknowns)
    }

    /// `x = M⁻¹ rhs`. Both slices must have length [`Preconditioner::size`].
    pub fn apply(&mut self, rhs: &[f64], x: &mut [f64]) -> AmgResult<()> {
        let built = self.state.live_mut(OBJECT, "apply")?;
        check_len("right-hand side", built.unknowns, rhs.len())?;
        check_len("solution", built.unknowns, x.len())?;
        built.backend.apply(rhs, x);
        Ok(())
    }

    /// Structural description of the hierarchy.
    pub fn describe(&self) -> AmgResult<EngineReport> {
        Ok(self.state.live(OBJECT, "report")?.backend.report())
    }

    /// Sends the build summary and the hierarchy report to `sink`.
    /// Never changes the preconditioner.
    pub fn report(&self, sink: &mut dyn EventSink) -> AmgResult<()> {
        let built = self.state.live(OBJECT, "report")?;
        sink.handle(&SessionEvent::new(OBJECT, built.built_event()));
        sink.handle(&SessionEvent::new(
            OBJECT,
            EventKind::Report(built.backend.report()),
        ));
        Ok(())
    }

    /// Attaches a sink that receives lifecycle events; returns the previous one.
    pub fn attach_sink(&mut self, sink: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.observer.attach(sink)
    }

    /// Removes the attached sink.
    pub fn detach_sink(&mut self) -> Option<Box<dyn EventSink>> {
        self.observer.detach()
    }

    /// Releases the hierarchy. A second call fails with `InvalidState`.
    pub fn destroy(&mut self) -> AmgResult<()> {
        let built = self.state.take_for_destroy(OBJECT)?;
        tracing::debug!(unknowns = built.unknowns, "preconditioner destroyed");
        drop(built);
        self.observer.emit(OBJECT, EventKind::Destroyed);
        self.observer.finalize();
        Ok(())
    }
}

impl fmt::Debug for Preconditioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Preconditioner");
        s.field("phase", &self.phase());
        if let HandleState::Live(built) = &self.state {
            s.field("engine", &built.engine).field("unknowns", &built.unknowns);
        }
        s.finish()
    }
}
