//! Integration tests for amgkit-session.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use amgkit_engine::{Engine, NativeEngine, PrecondBackend, SolverBackend};
use amgkit_params::{ParamSnapshot, ParameterStore};
use amgkit_session::{Preconditioner, SolverSession};
use amgkit_sparse::generators::poisson3d;
use amgkit_sparse::ops::{norm, spmv};
use amgkit_sparse::{CsrMatrix, CsrView};
use amgkit_telemetry::{EngineReport, EventKind, EventSink, SessionEvent, VecSink, WriterSink};
use amgkit_types::{AmgError, AmgResult, ConvergenceInfo, Phase};

// ─── Test Doubles ─────────────────────────────────────────────

/// Wraps the native engine and counts backends that are still alive.
#[derive(Clone, Default)]
struct CountingEngine {
    live: Arc<AtomicUsize>,
    built: Arc<AtomicUsize>,
}

impl CountingEngine {
    fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    fn track(&self) -> Guard {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.built.fetch_add(1, Ordering::SeqCst);
        Guard(Arc::clone(&self.live))
    }
}

struct Guard(Arc<AtomicUsize>);

impl Drop for Guard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct CountedPrecond {
    inner: Box<dyn PrecondBackend>,
    _guard: Guard,
}

impl PrecondBackend for CountedPrecond {
    fn size(&self) -> usize {
        self.inner.size()
    }
    fn nonzeros(&self) -> usize {
        self.inner.nonzeros()
    }
    fn apply(&mut self, rhs: &[f64], x: &mut [f64]) {
        self.inner.apply(rhs, x)
    }
    fn report(&self) -> EngineReport {
        self.inner.report()
    }
}

struct CountedSolver {
    inner: Box<dyn SolverBackend>,
    _guard: Guard,
}

impl SolverBackend for CountedSolver {
    fn size(&self) -> usize {
        self.inner.size()
    }
    fn nonzeros(&self) -> usize {
        self.inner.nonzeros()
    }
    fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> ConvergenceInfo {
        self.inner.solve(rhs, x)
    }
    fn solve_with_matrix(
        &mut self,
        matrix: CsrView<'_>,
        rhs: &[f64],
        x: &mut [f64],
    ) -> AmgResult<ConvergenceInfo> {
        self.inner.solve_with_matrix(matrix, rhs, x)
    }
    fn report(&self) -> EngineReport {
        self.inner.report()
    }
}

impl Engine for CountingEngine {
    fn name(&self) -> &str {
        "counting"
    }

    fn create_precond(
        &self,
        matrix: CsrView<'_>,
        params: &ParamSnapshot,
    ) -> AmgResult<Box<dyn PrecondBackend>> {
        let inner = NativeEngine.create_precond(matrix, params)?;
        Ok(Box::new(CountedPrecond {
            inner,
            _guard: self.track(),
        }))
    }

    fn create_solver(
        &self,
        matrix: CsrView<'_>,
        params: &ParamSnapshot,
    ) -> AmgResult<Box<dyn SolverBackend>> {
        let inner = NativeEngine.create_solver(matrix, params)?;
        Ok(Box::new(CountedSolver {
            inner,
            _guard: self.track(),
        }))
    }
}

/// Engine whose builds always fail with a plain matrix error.
struct RejectingEngine;

impl Engine for RejectingEngine {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn create_precond(&self, _: CsrView<'_>, _: &ParamSnapshot) -> AmgResult<Box<dyn PrecondBackend>> {
        Err(AmgError::InvalidMatrix("rejected on purpose".into()))
    }

    fn create_solver(&self, _: CsrView<'_>, _: &ParamSnapshot) -> AmgResult<Box<dyn SolverBackend>> {
        Err(AmgError::InvalidMatrix("rejected on purpose".into()))
    }
}

// ─── Helpers ──────────────────────────────────────────────────

fn sample_params() -> ParameterStore {
    let mut params = ParameterStore::created();
    params.set_int("precond.coarse_enough", 1000).unwrap();
    params
        .set_string("precond.coarsening.type", "smoothed_aggregation")
        .unwrap();
    params
        .set_float("precond.coarsening.aggr.eps_strong", 1e-3)
        .unwrap();
    params.set_string("precond.relax.type", "spai0").unwrap();
    params.set_string("solver.type", "bicgstabl").unwrap();
    params.set_int("solver.L", 1).unwrap();
    params.set_int("solver.maxiter", 100).unwrap();
    params
}

fn relative_error(x: &[f64], exact: &[f64]) -> f64 {
    let diff: Vec<f64> = x.iter().zip(exact).map(|(a, b)| a - b).collect();
    norm(&diff) / norm(exact)
}

// ─── Lifecycle Tests ──────────────────────────────────────────

#[test]
fn new_handles_are_uncreated() {
    assert_eq!(Preconditioner::new().phase(), Phase::Uncreated);
    assert_eq!(SolverSession::new().phase(), Phase::Uncreated);
}

#[test]
fn use_before_build_is_invalid_state() {
    let mut precond = Preconditioner::new();
    let mut x = vec![0.0; 4];
    let err = precond.apply(&[1.0; 4], &mut x).unwrap_err();
    assert!(matches!(
        err,
        AmgError::InvalidState {
            phase: Phase::Uncreated,
            ..
        }
    ));

    let mut solver = SolverSession::new();
    assert!(matches!(
        solver.solve(&[1.0; 4], &mut x),
        Err(AmgError::InvalidState { .. })
    ));
    assert!(solver.size().is_err());
    assert!(solver.describe().is_err());
    assert!(matches!(solver.destroy(), Err(AmgError::InvalidState { .. })));
    assert_eq!(solver.phase(), Phase::Uncreated);
}

#[test]
fn build_requires_live_parameter_store() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::new();
    let mut solver = SolverSession::new();
    let err = solver.build(problem.matrix.view(), &params).unwrap_err();
    assert!(matches!(
        err,
        AmgError::InvalidState {
            object: "parameter store",
            ..
        }
    ));
    assert_eq!(solver.phase(), Phase::Uncreated);
}

#[test]
fn double_destroy_is_invalid_state() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();

    let mut precond = Preconditioner::from_matrix(problem.matrix.view(), &params).unwrap();
    precond.destroy().unwrap();
    let err = precond.destroy().unwrap_err();
    assert!(matches!(
        err,
        AmgError::InvalidState {
            phase: Phase::Destroyed,
            operation: "destroy",
            ..
        }
    ));

    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    solver.destroy().unwrap();
    assert!(solver.destroy().is_err());
    assert_eq!(solver.phase(), Phase::Destroyed);
}

#[test]
fn destroyed_handle_cannot_be_rebuilt_or_used() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    solver.destroy().unwrap();

    let mut x = vec![0.0; 27];
    assert!(matches!(
        solver.solve(&problem.rhs, &mut x),
        Err(AmgError::InvalidState {
            phase: Phase::Destroyed,
            ..
        })
    ));
    assert!(solver.build(problem.matrix.view(), &params).is_err());
    assert_eq!(solver.phase(), Phase::Destroyed);
}

#[test]
fn second_build_on_live_handle_rejected() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();
    let mut precond = Preconditioner::from_matrix(problem.matrix.view(), &params).unwrap();
    let err = precond.build(problem.matrix.view(), &params).unwrap_err();
    assert!(matches!(
        err,
        AmgError::InvalidState {
            phase: Phase::Live,
            ..
        }
    ));
    assert_eq!(precond.phase(), Phase::Live);
}

#[test]
fn failed_build_stays_uncreated() {
    let ptr = [0, 1, 2];
    let col = [0, 9];
    let val = [1.0, 1.0];
    let view = CsrView::new(2, &ptr, &col, &val);
    let params = ParameterStore::created();

    let mut solver = SolverSession::new();
    let err = solver.build(view, &params).unwrap_err();
    assert!(matches!(err, AmgError::EngineConstruction(_)));
    assert_eq!(solver.phase(), Phase::Uncreated);

    // The same handle can be built once the input is fixed.
    let problem = poisson3d(3, 1.0);
    solver.build(problem.matrix.view(), &params).unwrap();
    assert_eq!(solver.phase(), Phase::Live);
}

#[test]
fn foreign_engine_errors_become_construction_errors() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();
    let mut precond = Preconditioner::new();
    let err = precond
        .build_with(&RejectingEngine, problem.matrix.view(), &params)
        .unwrap_err();
    match err {
        AmgError::EngineConstruction(msg) => assert!(msg.contains("rejected on purpose")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(precond.phase(), Phase::Uncreated);
}

#[test]
fn bad_parameter_value_fails_build() {
    let problem = poisson3d(3, 1.0);
    let mut params = ParameterStore::created();
    params.set_string("solver.type", "richardson").unwrap();
    let err = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap_err();
    assert!(matches!(err, AmgError::EngineConstruction(ref m) if m.contains("solver.type")));
}

// ─── Resource Accounting Tests ────────────────────────────────

#[test]
fn repeated_build_destroy_leaves_nothing_alive() {
    let engine = CountingEngine::default();
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();

    for _ in 0..50 {
        let mut precond = Preconditioner::new();
        precond.build_with(&engine, problem.matrix.view(), &params).unwrap();
        let mut solver = SolverSession::new();
        solver.build_with(&engine, problem.matrix.view(), &params).unwrap();
        assert_eq!(engine.live(), 2);

        precond.destroy().unwrap();
        solver.destroy().unwrap();
        assert_eq!(engine.live(), 0);
    }
    assert_eq!(engine.built(), 100);
}

#[test]
fn dropping_live_handle_releases_backend() {
    let engine = CountingEngine::default();
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();
    {
        let mut solver = SolverSession::new();
        solver.build_with(&engine, problem.matrix.view(), &params).unwrap();
        assert_eq!(engine.live(), 1);
    }
    assert_eq!(engine.live(), 0);
}

#[test]
fn rejected_build_allocates_nothing() {
    let engine = CountingEngine::default();
    let ptr = [0, 2];
    let view = CsrView::new(1, &ptr, &[0], &[1.0]);
    let params = ParameterStore::created();
    let mut solver = SolverSession::new();
    assert!(solver.build_with(&engine, view, &params).is_err());
    assert_eq!(engine.built(), 0);
    assert_eq!(engine.live(), 0);
}

// ─── Snapshot Tests ───────────────────────────────────────────

#[test]
fn parameter_store_can_be_destroyed_after_build() {
    let problem = poisson3d(4, 1.0);
    let mut params = sample_params();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    params.destroy().unwrap();

    let mut x = vec![0.0; problem.size()];
    let info = solver.solve(&problem.rhs, &mut x).unwrap();
    assert!(info.converged);
}

#[test]
fn later_store_mutation_does_not_reach_built_session() {
    let problem = poisson3d(8, 1.0);
    let mut params = ParameterStore::created();
    params.set_int("precond.coarse_enough", 50).unwrap();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

    params.set_int("solver.maxiter", 1).unwrap();
    params.set_string("solver.type", "not-a-solver").unwrap();

    let mut x = vec![0.0; problem.size()];
    let info = solver.solve(&problem.rhs, &mut x).unwrap();
    assert!(info.converged);
    assert!(info.iterations > 1);
    assert_eq!(solver.describe().unwrap().solver.unwrap().method, "BiCGStab");
}

// ─── Solve Tests ──────────────────────────────────────────────

#[test]
fn poisson_4x4x4_bicgstabl_scenario() {
    let problem = poisson3d(4, 1.0);
    let mut params = ParameterStore::created();
    params.set_string("solver.type", "bicgstabl").unwrap();
    params.set_int("solver.maxiter", 100).unwrap();

    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    let mut x = vec![0.0; 64];
    let info = solver.solve(&[1.0; 64], &mut x).unwrap();

    assert!(info.iterations < 100);
    assert!(info.residual < 1e-6);
    assert!(info.converged);
    assert_eq!(solver.last_convergence(), Some(info));
}

#[test]
fn recovers_manufactured_solution() {
    let problem = poisson3d(10, 1.0);
    let a = &problem.matrix;
    let x0: Vec<f64> = (0..a.rows).map(|i| ((i * 13) % 17) as f64 / 17.0 + 0.5).collect();
    let mut rhs = vec![0.0; a.rows];
    spmv(a, &x0, &mut rhs);

    let mut params = sample_params();
    params.set_int("precond.coarse_enough", 100).unwrap();
    params.set_float("solver.tol", 1e-10).unwrap();
    let mut solver = SolverSession::from_matrix(a.view(), &params).unwrap();

    let mut x = vec![0.0; a.rows];
    let info = solver.solve(&rhs, &mut x).unwrap();
    assert!(info.iterations < 100, "{info}");
    assert!(relative_error(&x, &x0) < 1e-7);
}

#[test]
fn iterations_never_exceed_maxiter() {
    let problem = poisson3d(8, 1.0);
    for maxiter in [0i64, 1, 3, 7] {
        let mut params = ParameterStore::created();
        params.set_int("solver.maxiter", maxiter).unwrap();
        params.set_float("solver.tol", 1e-15).unwrap();
        params.set_int("precond.coarse_enough", 50).unwrap();
        params.set_string("precond.relax.type", "damped_jacobi").unwrap();
        let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

        let mut x = vec![0.0; problem.size()];
        let info = solver.solve(&problem.rhs, &mut x).unwrap();
        assert!(info.iterations <= maxiter as usize, "maxiter {maxiter}: {info}");
    }
}

#[test]
fn non_convergence_is_reported_not_raised() {
    let problem = poisson3d(8, 1.0);
    let mut params = ParameterStore::created();
    params.set_int("solver.maxiter", 1).unwrap();
    params.set_float("solver.tol", 1e-15).unwrap();
    params.set_int("precond.coarse_enough", 50).unwrap();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

    let mut x = vec![0.0; problem.size()];
    let info = solver.solve(&problem.rhs, &mut x).unwrap();
    assert!(!info.converged);
    assert_eq!(info.iterations, 1);
    assert_eq!(solver.phase(), Phase::Live);
}

#[test]
fn wrong_length_rhs_keeps_session_live() {
    let problem = poisson3d(4, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

    let mut x = vec![0.0; 64];
    let err = solver.solve(&[1.0; 63], &mut x).unwrap_err();
    assert!(matches!(
        err,
        AmgError::DimensionMismatch {
            what: "right-hand side",
            expected: 64,
            actual: 63
        }
    ));
    assert!(err.is_usage_error());
    assert_eq!(solver.phase(), Phase::Live);
    assert!(solver.last_convergence().is_none());

    let mut short = vec![0.0; 10];
    assert!(solver.solve(&problem.rhs, &mut short).is_err());

    let info = solver.solve(&problem.rhs, &mut x).unwrap();
    assert!(info.converged);
}

#[test]
fn solve_with_matrix_leaves_bound_matrix_in_place() {
    let problem = poisson3d(4, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

    let mut shifted = problem.matrix.clone();
    for i in 0..shifted.rows {
        for k in shifted.row_ptr[i]..shifted.row_ptr[i + 1] {
            if shifted.col_idx[k] == i {
                shifted.values[k] += 1.0;
            }
        }
    }

    let mut x_shifted = vec![0.0; 64];
    let info = solver
        .solve_with_matrix(shifted.view(), &problem.rhs, &mut x_shifted)
        .unwrap();
    assert!(info.converged);
    assert_eq!(solver.last_convergence(), Some(info));

    let mut x_bound = vec![0.0; 64];
    solver.solve(&problem.rhs, &mut x_bound).unwrap();

    let mut check = vec![0.0; 64];
    spmv(&shifted, &x_shifted, &mut check);
    assert!(relative_error(&check, &problem.rhs) < 1e-6);
    spmv(&problem.matrix, &x_bound, &mut check);
    assert!(relative_error(&check, &problem.rhs) < 1e-6);
    assert!(relative_error(&x_shifted, &x_bound) > 1e-3);
}

#[test]
fn solve_with_matrix_checks_dimension_and_structure() {
    let problem = poisson3d(4, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    let mut x = vec![0.0; 64];

    let small = CsrMatrix::identity(8);
    let err = solver
        .solve_with_matrix(small.view(), &problem.rhs, &mut x)
        .unwrap_err();
    assert!(matches!(err, AmgError::DimensionMismatch { what: "matrix", .. }));

    let mut ptr = vec![0usize; 65];
    ptr[64] = 1;
    let bad = CsrView::new(64, &ptr, &[], &[]);
    let err = solver
        .solve_with_matrix(bad, &problem.rhs, &mut x)
        .unwrap_err();
    assert!(matches!(err, AmgError::EngineConstruction(_)));
    assert_eq!(solver.phase(), Phase::Live);
}

#[test]
fn zero_rhs_yields_zero_solution() {
    let problem = poisson3d(4, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    let mut x = vec![3.0; 64];
    let info = solver.solve(&[0.0; 64], &mut x).unwrap();
    assert_eq!(info, ConvergenceInfo::trivial());
    assert!(x.iter().all(|&v| v == 0.0));
}

// ─── Preconditioner Tests ─────────────────────────────────────

#[test]
fn preconditioner_apply_approximates_inverse() {
    let problem = poisson3d(8, 1.0);
    let mut params = ParameterStore::created();
    params.set_int("precond.coarse_enough", 50).unwrap();
    let mut precond = Preconditioner::from_matrix(problem.matrix.view(), &params).unwrap();
    assert_eq!(precond.size().unwrap(), 512);

    let mut x = vec![0.0; 512];
    precond.apply(&problem.rhs, &mut x).unwrap();

    // One V-cycle from zero already reduces the residual.
    let mut ax = vec![0.0; 512];
    spmv(&problem.matrix, &x, &mut ax);
    assert!(relative_error(&ax, &problem.rhs) < 0.9);
}

#[test]
fn preconditioner_apply_checks_lengths() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();
    let mut precond = Preconditioner::from_matrix(problem.matrix.view(), &params).unwrap();
    let mut x = vec![0.0; 26];
    let err = precond.apply(&problem.rhs, &mut x).unwrap_err();
    assert!(matches!(
        err,
        AmgError::DimensionMismatch {
            what: "solution",
            ..
        }
    ));
    assert_eq!(precond.phase(), Phase::Live);
}

// ─── Report Tests ─────────────────────────────────────────────

#[test]
fn report_is_idempotent_and_side_effect_free() {
    let problem = poisson3d(8, 1.0);
    let mut params = sample_params();
    params.set_int("precond.coarse_enough", 50).unwrap();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

    let mut x1 = vec![0.0; 512];
    let first = solver.solve(&problem.rhs, &mut x1).unwrap();

    let mut sink = VecSink::new();
    for _ in 0..3 {
        solver.report(&mut sink).unwrap();
    }
    assert_eq!(sink.events.len(), 6);
    let rendered: Vec<String> = sink
        .drain()
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    assert_eq!(rendered[0], rendered[2]);
    assert_eq!(rendered[1], rendered[5]);

    let mut x2 = vec![0.0; 512];
    let second = solver.solve(&problem.rhs, &mut x2).unwrap();
    assert_eq!(first, second);
    assert_eq!(x1, x2);
}

#[test]
fn report_renders_hierarchy_table() {
    let problem = poisson3d(8, 1.0);
    let mut params = sample_params();
    params.set_int("precond.coarse_enough", 50).unwrap();
    let solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();

    let mut sink = WriterSink::new(Vec::new());
    solver.report(&mut sink).unwrap();
    let text = String::from_utf8(sink.into_inner()).unwrap();

    assert!(text.contains("solver session built by native: 512 unknowns"));
    assert!(text.contains("BiCGStab(1)"));
    assert!(text.contains("Number of levels:"));
}

#[test]
fn preconditioner_report_has_levels() {
    let problem = poisson3d(8, 1.0);
    let mut params = ParameterStore::created();
    params.set_int("precond.coarse_enough", 50).unwrap();
    let precond = Preconditioner::from_matrix(problem.matrix.view(), &params).unwrap();

    let mut sink = VecSink::new();
    precond.report(&mut sink).unwrap();
    match &sink.events[1].kind {
        EventKind::Report(report) => {
            assert_eq!(report.levels[0].unknowns, 512);
            assert!(report.num_levels() >= 2);
            assert!(report.solver.is_none());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn report_on_destroyed_handle_fails() {
    let problem = poisson3d(3, 1.0);
    let params = ParameterStore::created();
    let mut precond = Preconditioner::from_matrix(problem.matrix.view(), &params).unwrap();
    precond.destroy().unwrap();
    let mut sink = VecSink::new();
    assert!(precond.report(&mut sink).is_err());
    assert!(sink.events.is_empty());
}

#[test]
fn attach_replaces_and_detach_returns_sink() {
    let mut solver = SolverSession::new();
    assert!(solver.attach_sink(Box::new(VecSink::new())).is_none());
    let previous = solver.attach_sink(Box::new(WriterSink::new(Vec::new())));
    assert_eq!(previous.unwrap().name(), "vec_sink");
    assert_eq!(solver.detach_sink().unwrap().name(), "writer_sink");
    assert!(solver.detach_sink().is_none());
}

#[test]
fn observer_event_order() {
    #[derive(Clone, Default)]
    struct SharedSink(Arc<std::sync::Mutex<Vec<String>>>);

    impl EventSink for SharedSink {
        fn handle(&mut self, event: &SessionEvent) {
            let tag = match &event.kind {
                EventKind::Built { .. } => "built",
                EventKind::Convergence(_) => "convergence",
                EventKind::Destroyed => "destroyed",
                _ => "other",
            };
            self.0.lock().unwrap().push(tag.to_string());
        }
        fn name(&self) -> &str {
            "shared"
        }
    }

    let shared = SharedSink::default();
    let problem = poisson3d(4, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::new();
    solver.attach_sink(Box::new(shared.clone()));

    solver.build(problem.matrix.view(), &params).unwrap();
    let mut x = vec![0.0; 64];
    solver.solve(&problem.rhs, &mut x).unwrap();
    solver.solve(&problem.rhs, &mut x).unwrap();
    solver.destroy().unwrap();

    let seen = shared.0.lock().unwrap().clone();
    assert_eq!(seen, ["built", "convergence", "convergence", "destroyed"]);
}

// ─── Parameter Loading Scenario ───────────────────────────────

#[test]
fn malformed_json_then_successful_build() {
    let path = std::env::temp_dir().join(format!("amgkit-session-bad-{}.json", std::process::id()));
    std::fs::write(&path, "{ \"solver\": { \"type\": \"cg\", ").unwrap();

    let mut params = ParameterStore::created();
    params.set_string("solver.type", "bicgstab").unwrap();
    assert!(params.load_json(&path).is_err());
    assert!(params.load_json("/nonexistent/amgkit/params.json").is_err());
    std::fs::remove_file(&path).ok();

    assert_eq!(params.phase(), Phase::Live);
    assert_eq!(params.len().unwrap(), 1);

    let problem = poisson3d(4, 1.0);
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    let mut x = vec![0.0; 64];
    assert!(solver.solve(&problem.rhs, &mut x).unwrap().converged);
}

#[test]
fn json_parameters_drive_the_build() {
    let path = std::env::temp_dir().join(format!("amgkit-session-good-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "solver": { "type": "gmres", "M": 15 }, "precond": { "coarse_enough": 50 } }"#,
    )
    .unwrap();

    let mut params = ParameterStore::created();
    assert_eq!(params.load_json(&path).unwrap(), 3);
    std::fs::remove_file(&path).ok();

    let problem = poisson3d(8, 1.0);
    let solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    let report = solver.describe().unwrap();
    assert_eq!(report.solver.unwrap().method, "GMRES(15)");
    assert!(report.levels.len() >= 2);
}

// ─── Concurrency Tests ────────────────────────────────────────

#[test]
fn distinct_sessions_run_on_separate_threads() {
    let handles: Vec<_> = (3..6)
        .map(|n| {
            std::thread::spawn(move || {
                let problem = poisson3d(n, 1.0);
                let params = ParameterStore::created();
                let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
                let mut x = vec![0.0; problem.size()];
                solver.solve(&problem.rhs, &mut x).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().converged);
    }
}

#[test]
fn session_moves_across_threads() {
    let problem = poisson3d(4, 1.0);
    let params = ParameterStore::created();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params).unwrap();
    let rhs = problem.rhs.clone();
    let info = std::thread::spawn(move || {
        let mut x = vec![0.0; rhs.len()];
        let info = solver.solve(&rhs, &mut x).unwrap();
        solver.destroy().unwrap();
        info
    })
    .join()
    .unwrap();
    assert!(info.converged);
}
