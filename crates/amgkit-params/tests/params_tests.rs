//! Integration tests for amgkit-params.

use std::path::PathBuf;

use amgkit_params::document::{parse_json, parse_toml};
use amgkit_params::{ParamSnapshot, ParamValue, ParameterStore};
use amgkit_types::{AmgError, Phase};

fn fixture(tag: &str, ext: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "amgkit-params-{}-{tag}.{ext}",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

// ─── Lifecycle Tests ──────────────────────────────────────────

#[test]
fn set_before_create_is_invalid_state() {
    let mut prm = ParameterStore::new();
    let err = prm.set_int("solver.maxiter", 10).unwrap_err();
    assert!(matches!(err, AmgError::InvalidState { phase: Phase::Uncreated, .. }));
}

#[test]
fn create_set_destroy() {
    let mut prm = ParameterStore::new();
    prm.create().unwrap();
    assert_eq!(prm.phase(), Phase::Live);
    prm.set_int("precond.coarse_enough", 1000).unwrap();
    prm.set_string("precond.coarsening.type", "smoothed_aggregation").unwrap();
    prm.set_float("precond.coarsening.aggr.eps_strong", 1e-3).unwrap();
    prm.set_bool("precond.direct_coarse", false).unwrap();
    assert_eq!(prm.len().unwrap(), 4);
    prm.destroy().unwrap();
    assert_eq!(prm.phase(), Phase::Destroyed);
}

#[test]
fn double_destroy_fails() {
    let mut prm = ParameterStore::created();
    prm.destroy().unwrap();
    let err = prm.destroy().unwrap_err();
    assert!(matches!(err, AmgError::InvalidState { phase: Phase::Destroyed, .. }));
}

#[test]
fn use_after_destroy_fails() {
    let mut prm = ParameterStore::created();
    prm.destroy().unwrap();
    assert!(prm.set_string("solver.type", "cg").is_err());
    assert!(prm.snapshot().is_err());
    assert!(prm.get("solver.type").is_err());
    assert!(prm.load_json_str("{}").is_err());
}

#[test]
fn create_twice_fails() {
    let mut prm = ParameterStore::created();
    assert!(prm.create().is_err());
}

// ─── Setter Tests ─────────────────────────────────────────────

#[test]
fn later_set_overwrites() {
    let mut prm = ParameterStore::created();
    prm.set_int("solver.maxiter", 10).unwrap();
    prm.set_int("solver.maxiter", 20).unwrap();
    assert_eq!(prm.len().unwrap(), 1);
    assert_eq!(prm.get("solver.maxiter").unwrap(), Some(&ParamValue::Int(20)));
}

#[test]
fn overwrite_may_change_type() {
    let mut prm = ParameterStore::created();
    prm.set_int("solver.tol", 1).unwrap();
    prm.set_float("solver.tol", 1e-6).unwrap();
    assert_eq!(prm.get("solver.tol").unwrap(), Some(&ParamValue::Float(1e-6)));
}

#[test]
fn bad_names_rejected() {
    let mut prm = ParameterStore::created();
    assert!(prm.set_int("", 1).is_err());
    assert!(prm.set_int("solver..maxiter", 1).is_err());
    assert!(prm.set_int("solver. maxiter", 1).is_err());
    assert_eq!(prm.len().unwrap(), 0);
}

// ─── Snapshot Tests ───────────────────────────────────────────

#[test]
fn snapshot_is_isolated_from_store() {
    let mut prm = ParameterStore::created();
    prm.set_string("solver.type", "cg").unwrap();
    let snap = prm.snapshot().unwrap();

    prm.set_string("solver.type", "gmres").unwrap();
    prm.destroy().unwrap();

    assert_eq!(snap.str_or("solver.type", "bicgstab").unwrap(), "cg");
}

#[test]
fn snapshot_typed_getters() {
    let snap = ParamSnapshot::new()
        .with("solver.maxiter", 50)
        .with("solver.tol", 1e-6)
        .with("solver.type", "cg")
        .with("precond.direct_coarse", false)
        .with("precond.npre", "2");

    assert_eq!(snap.usize_or("solver.maxiter", 100).unwrap(), 50);
    assert_eq!(snap.usize_or("solver.L", 2).unwrap(), 2);
    assert_eq!(snap.f64_or("solver.tol", 1e-8).unwrap(), 1e-6);
    assert_eq!(snap.f64_or("solver.maxiter", 0.0).unwrap(), 50.0);
    assert_eq!(snap.str_or("solver.type", "bicgstab").unwrap(), "cg");
    assert!(!snap.bool_or("precond.direct_coarse", true).unwrap());
    assert_eq!(snap.usize_or("precond.npre", 1).unwrap(), 2);
}

#[test]
fn snapshot_type_errors() {
    let snap = ParamSnapshot::new()
        .with("solver.maxiter", -5)
        .with("solver.type", 3)
        .with("solver.tol", "tight");

    assert!(matches!(
        snap.usize_or("solver.maxiter", 100),
        Err(AmgError::InvalidParameter { .. })
    ));
    assert!(snap.str_or("solver.type", "cg").is_err());
    assert!(snap.f64_or("solver.tol", 1e-8).is_err());
}

#[test]
fn snapshot_unknown_names() {
    let snap = ParamSnapshot::new().with("solver.type", "cg").with("solver.typo", 1);
    assert_eq!(snap.unknown(&["solver.type"]), vec!["solver.typo"]);
}

#[test]
fn snapshot_to_json_nests() {
    let snap = ParamSnapshot::new()
        .with("solver.type", "cg")
        .with("solver.maxiter", 10)
        .with("precond.relax.type", "spai0");
    let json = snap.to_json().unwrap();
    assert_eq!(json["solver"]["type"], "cg");
    assert_eq!(json["solver"]["maxiter"], 10);
    assert_eq!(json["precond"]["relax"]["type"], "spai0");
}

#[test]
fn snapshot_to_json_conflict() {
    let snap = ParamSnapshot::new().with("solver", 1).with("solver.type", "cg");
    assert!(snap.to_json().is_err());
}

// ─── Document Tests ───────────────────────────────────────────

#[test]
fn json_flattening() {
    let entries = parse_json(
        r#"{"solver": {"type": "bicgstabl", "L": 1, "tol": 1e-6},
            "precond": {"coarsening": {"aggr": {"eps_strong": 0.001}}, "direct_coarse": true}}"#,
    )
    .unwrap();
    let snap: ParamSnapshot = entries.into_iter().collect();
    assert_eq!(snap.get("solver.type"), Some(&ParamValue::Str("bicgstabl".into())));
    assert_eq!(snap.get("solver.L"), Some(&ParamValue::Int(1)));
    assert_eq!(snap.get("solver.tol"), Some(&ParamValue::Float(1e-6)));
    assert_eq!(
        snap.get("precond.coarsening.aggr.eps_strong"),
        Some(&ParamValue::Float(0.001))
    );
    assert_eq!(snap.get("precond.direct_coarse"), Some(&ParamValue::Bool(true)));
}

#[test]
fn json_rejects_arrays_and_non_objects() {
    assert!(matches!(
        parse_json(r#"{"solver": {"type": ["cg"]}}"#),
        Err(AmgError::Serialization(_))
    ));
    assert!(parse_json("[1, 2]").is_err());
    assert!(parse_json(r#"{"solver": null}"#).is_err());
}

#[test]
fn toml_flattening() {
    let entries = parse_toml(
        "[solver]\ntype = \"gmres\"\nM = 20\n\n[precond.relax]\ntype = \"damped_jacobi\"\ndamping = 0.5\n",
    )
    .unwrap();
    let snap: ParamSnapshot = entries.into_iter().collect();
    assert_eq!(snap.usize_or("solver.M", 30).unwrap(), 20);
    assert_eq!(snap.str_or("precond.relax.type", "spai0").unwrap(), "damped_jacobi");
    assert_eq!(snap.f64_or("precond.relax.damping", 0.72).unwrap(), 0.5);
}

// ─── File Loading Tests ───────────────────────────────────────

#[test]
fn load_json_merges_into_store() {
    let path = fixture("merge", "json", r#"{"solver": {"type": "cg", "maxiter": 42}}"#);
    let mut prm = ParameterStore::created();
    prm.set_int("solver.maxiter", 7).unwrap();
    prm.set_int("precond.npre", 2).unwrap();
    let loaded = prm.load_json(&path).unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(prm.len().unwrap(), 3);
    assert_eq!(prm.get("solver.maxiter").unwrap(), Some(&ParamValue::Int(42)));
    std::fs::remove_file(path).ok();
}

#[test]
fn load_json_missing_file_leaves_store_intact() {
    let mut prm = ParameterStore::created();
    prm.set_string("solver.type", "cg").unwrap();
    let err = prm
        .load_json("/nonexistent/amgkit/params.json")
        .unwrap_err();
    assert!(matches!(err, AmgError::Io(_)));
    assert_eq!(prm.phase(), Phase::Live);
    assert_eq!(prm.len().unwrap(), 1);
}

#[test]
fn load_json_malformed_is_all_or_nothing() {
    let path = fixture("malformed", "json", r#"{"solver": {"type": "gmres", "M": [1]}}"#);
    let mut prm = ParameterStore::created();
    prm.set_string("solver.type", "cg").unwrap();
    assert!(prm.load_json(&path).is_err());
    assert_eq!(prm.get("solver.type").unwrap(), Some(&ParamValue::Str("cg".into())));
    assert_eq!(prm.len().unwrap(), 1);
    std::fs::remove_file(path).ok();
}

#[test]
fn load_file_dispatches_on_extension() {
    let path = fixture("dispatch", "toml", "[solver]\nmaxiter = 9\n");
    let mut prm = ParameterStore::created();
    prm.load_file(&path).unwrap();
    assert_eq!(prm.get("solver.maxiter").unwrap(), Some(&ParamValue::Int(9)));
    std::fs::remove_file(path).ok();
}

#[test]
fn load_before_create_fails() {
    let mut prm = ParameterStore::new();
    assert!(matches!(
        prm.load_json("whatever.json"),
        Err(AmgError::InvalidState { .. })
    ));
}
