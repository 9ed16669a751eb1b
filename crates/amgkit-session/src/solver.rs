//! Krylov solver session handle.

use std::fmt;
use std::time::Instant;

use amgkit_engine::{Engine, NativeEngine, SolverBackend};
use amgkit_params::ParameterStore;
use amgkit_sparse::CsrView;
use amgkit_telemetry::{EngineReport, EventKind, EventSink, SessionEvent};
use amgkit_types::{AmgError, AmgResult, ConvergenceInfo, HandleState, Phase};

use crate::handle::{check_len, Built, Observer};

const OBJECT: &str = "solver session";

/// An AMG-preconditioned Krylov solver bound to one matrix.
///
/// `solve` uses the matrix supplied at build time. `solve_with_matrix`
/// rebuilds the hierarchy from a new matrix of the same dimension for that
/// call only; the bound matrix stays in place for later `solve` calls.
///
/// Running out of iterations is not an error: check
/// [`ConvergenceInfo::converged`].
#[derive(Default)]
pub struct SolverSession {
    state: HandleState<Built<dyn SolverBackend>>,
    last: Option<ConvergenceInfo>,
    observer: Observer,
}

impl SolverSession {
    /// Creates an unbuilt handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and builds a session with the native engine.
    pub fn from_matrix(matrix: CsrView<'_>, params: &ParameterStore) -> AmgResult<Self> {
        let mut session = Self::new();
        session.build(matrix, params)?;
        Ok(session)
    }

    /// Builds with the native engine. See [`SolverSession::build_with`].
    pub fn build(&mut self, matrix: CsrView<'_>, params: &ParameterStore) -> AmgResult<()> {
        self.build_with(&NativeEngine, matrix, params)
    }

    /// Builds the solver and its preconditioner, moving `Uncreated → Live`.
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
            .create_solver(matrix, &snapshot)
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
            "solver session built"
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

    /// Solves `A x = rhs` with the bound matrix.
    ///
    /// `x` holds the initial guess on entry and the solution on return.
    /// A length mismatch fails without touching `x`, and the session stays
    /// live.
    pub fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> AmgResult<ConvergenceInfo> {
        let built = self.state.live_mut(OBJECT, "solve with")?;
        check_len("right-hand side", built.unknowns, rhs.len())?;
        check_len("solution", built.unknowns, x.len())?;
        let info = built.backend.solve(rhs, x);
        self.record(info);
        Ok(info)
    }

    /// Solves `matrix · x = rhs` for this call only.
    ///
    /// `matrix.n` must equal the bound dimension. The hierarchy is rebuilt
    /// from `matrix`, so structure and coefficients may both differ from the
    /// bound matrix; a rejected matrix fails with `EngineConstruction` and
    /// leaves the session live.
    pub fn solve_with_matrix(
        &mut self,
        matrix: CsrView<'_>,
        rhs: &[f64],
        x: &mut [f64],
    ) -> AmgResult<ConvergenceInfo> {
        let built = self.state.live_mut(OBJECT, "solve with")?;
        check_len("matrix", built.unknowns, matrix.n)?;
        check_len("right-hand side", built.unknowns, rhs.len())?;
        check_len("solution", built.unknowns, x.len())?;
        let info = built.backend.solve_with_matrix(matrix, rhs, x)?;
        self.record(info);
        Ok(info)
    }

    fn record(&mut self, info: ConvergenceInfo) {
        if !info.converged {
            tracing::warn!(
                iterations = info.iterations,
                residual = info.residual,
                "solver did not converge"
            );
        }
        self.last = Some(info);
        self.observer.emit(OBJECT, EventKind::Convergence(info));
    }

    /// Result of the most recent successful solve, if any.
    pub fn last_convergence(&self) -> Option<ConvergenceInfo> {
        self.last
    }

    /// Structural description of the solver and its hierarchy.
    pub fn describe(&self) -> AmgResult<EngineReport> {
        Ok(self.state.live(OBJECT, "report")?.backend.report())
    }

    /// Sends the build summary and the solver report to `sink`.
    /// Never changes the session.
    pub fn report(&self, sink: &mut dyn EventSink) -> AmgResult<()> {
        let built = self.state.live(OBJECT, "report")?;
        sink.handle(&SessionEvent::new(OBJECT, built.built_event()));
        sink.handle(&SessionEvent::new(
            OBJECT,
            EventKind::Report(built.backend.report()),
        ));
        Ok(())
    }

    /// Attaches a sink that receives lifecycle and convergence events;
    /// returns the previous one.
    pub fn attach_sink(&mut self, sink: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.observer.attach(sink)
    }

    /// Removes the attached sink.
    pub fn detach_sink(&mut self) -> Option<Box<dyn EventSink>> {
        self.observer.detach()
    }

    /// Releases the solver. A second call fails with `InvalidState`.
    pub fn destroy(&mut self) -> AmgResult<()> {
        let built = self.state.take_for_destroy(OBJECT)?;
        tracing::debug!(unknowns = built.unknowns, "solver session destroyed");
        drop(built);
        self.observer.emit(OBJECT, EventKind::Destroyed);
        self.observer.finalize();
        Ok(())
    }
}

impl fmt::Debug for SolverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SolverSession");
        s.field("phase", &self.phase());
        if let HandleState::Live(built) = &self.state {
            s.field("engine", &built.engine).field("unknowns", &built.unknowns);
        }
        s.field("last_convergence", &self.last).finish()
    }
}
