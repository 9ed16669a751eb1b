//! amgkit CLI: sample-problem solves and parameter-file validation.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "amgkit")]
#[command(version, about = "amgkit — AMG-preconditioned Krylov solvers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the 3-D Poisson sample problem.
    Solve {
        /// Grid points per dimension (the system has size³ unknowns).
        #[arg(short = 'n', long, default_value_t = 32)]
        size: usize,

        /// Grid anisotropy (hy = hx·a, hz = hy·a).
        #[arg(short, long, default_value_t = 1.0)]
        anisotropy: f64,

        /// Parameter file (JSON, or TOML by extension).
        #[arg(short, long)]
        params: Option<String>,

        /// Extra parameter, applied after the file (repeatable).
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Print the hierarchy report after the build.
        #[arg(short, long)]
        report: bool,
    },

    /// Check that a parameter file loads and that every known entry is usable.
    Validate {
        /// Path to a JSON or TOML parameter file.
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve {
            size,
            anisotropy,
            params,
            set,
            report,
        } => commands::solve(&commands::SolveArgs {
            size,
            anisotropy,
            params: params.as_deref(),
            assignments: &set,
            report,
        }),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
