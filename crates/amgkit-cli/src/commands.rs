//! CLI command implementations.

use std::time::Instant;

use amgkit_engine::config::KNOWN_PARAMETERS;
use amgkit_engine::{AmgConfig, KrylovConfig};
use amgkit_params::{ParamValue, ParameterStore};
use amgkit_session::SolverSession;
use amgkit_sparse::generators::poisson3d;
use amgkit_telemetry::WriterSink;
use amgkit_types::{AmgError, AmgResult};

/// Options for [`solve`].
pub struct SolveArgs<'a> {
    pub size: usize,
    pub anisotropy: f64,
    pub params: Option<&'a str>,
    pub assignments: &'a [String],
    pub report: bool,
}

/// Build and solve the 3-D Poisson sample problem.
pub fn solve(args: &SolveArgs<'_>) -> Result<(), Box<dyn std::error::Error>> {
    println!("amgkit Poisson Solve");
    println!("────────────────────");
    println!();

    let mut params = ParameterStore::created();
    if let Some(path) = args.params {
        let count = params.load_file(path)?;
        println!("Parameters:  {count} from {path}");
    }
    for assignment in args.assignments {
        let (name, value) = parse_assignment(assignment)?;
        params.set(&name, value)?;
    }

    let problem = poisson3d(args.size, args.anisotropy);
    println!(
        "Problem:     {}³ grid, {} unknowns, {} nonzeros",
        args.size,
        problem.size(),
        problem.matrix.nnz()
    );

    let start = Instant::now();
    let mut solver = SolverSession::from_matrix(problem.matrix.view(), &params)?;
    let setup = start.elapsed();
    params.destroy()?;

    if args.report {
        println!();
        let mut sink = WriterSink::stdout();
        solver.report(&mut sink)?;
        if let Some(e) = sink.error() {
            return Err(format!("failed to print report: {e}").into());
        }
        println!();
    }

    let mut x = vec![0.0; problem.size()];
    let start = Instant::now();
    let info = solver.solve(&problem.rhs, &mut x)?;
    let elapsed = start.elapsed();

    println!("Iterations:  {}", info.iterations);
    println!("Residual:    {:.6e}", info.residual);
    println!("Setup:       {:.3}ms", setup.as_secs_f64() * 1000.0);
    println!("Solve:       {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    if info.converged {
        println!("✅ Converged.");
    } else {
        println!("❌ Did not converge within the iteration limit.");
    }

    solver.destroy()?;
    Ok(())
}

/// Validate a parameter file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("amgkit Parameter Validator");
    println!("──────────────────────────");
    println!();

    let mut params = ParameterStore::created();
    let count = params.load_file(path)?;
    let snapshot = params.snapshot()?;
    params.destroy()?;
    println!("Loaded {count} parameters from {path}");

    for name in snapshot.unknown(KNOWN_PARAMETERS) {
        println!("⚠️  Unrecognized parameter: {name}");
    }

    let checks = [
        ("preconditioner", AmgConfig::from_snapshot(&snapshot).map(|_| ())),
        ("solver", KrylovConfig::from_snapshot(&snapshot).map(|_| ())),
    ];
    let mut failed = false;
    for (section, check) in checks {
        match check {
            Ok(()) => println!("✅ {section} settings are valid."),
            Err(e) => {
                println!("❌ {section} settings: {e}");
                failed = true;
            }
        }
    }

    if failed {
        return Err("parameter file failed validation".into());
    }
    Ok(())
}

/// Splits `name=value`, inferring the value type: `true`/`false`, then
/// integer, then float, otherwise a string.
pub fn parse_assignment(text: &str) -> AmgResult<(String, ParamValue)> {
    let Some((name, raw)) = text.split_once('=') else {
        return Err(AmgError::parameter(text, "expected NAME=VALUE"));
    };
    let name = name.trim();
    let raw = raw.trim();
    if name.is_empty() {
        return Err(AmgError::parameter(text, "missing parameter name"));
    }

    let value = match raw {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                ParamValue::Int(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                ParamValue::Float(f)
            } else {
                ParamValue::Str(raw.to_string())
            }
        }
    };
    Ok((name.to_string(), value))
}
