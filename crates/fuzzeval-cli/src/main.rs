//! fuzzeval - fuzzing-evaluation utilities for SMT solvers
//!
//! Independent command-line utilities used by the cvc5/Z3 fuzzing
//! evaluation pipeline. Results go to stdout (or an output file);
//! diagnostics and logs go to stderr. Every subcommand exits 0 on success
//! and 1 on failure.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// fuzzeval - fuzzing-evaluation utilities for SMT solvers
#[derive(Parser, Debug)]
#[command(name = "fuzzeval")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a sancov coverage allowlist from prepared-commit output
    Allowlist(commands::allowlist::AllowlistArgs),

    /// Parse and format sancov coverage statistics
    SancovStats(commands::sancov::SancovStatsArgs),

    /// Extract the test list for a commit and job id from a fuzzing matrix
    ExtractMatrixTests(commands::matrix::ExtractMatrixTestsArgs),

    /// Shuffle all tests and split them into baseline fuzzing jobs
    PickRandomTests(commands::baseline::PickRandomTestsArgs),

    /// Read changed functions from per-commit fuzzing statistics
    ChangedFunctions(commands::statistics::ChangedFunctionsArgs),
}

fn main() {
    let cli = Cli::parse();

    // Logs share stderr with diagnostics so stdout stays machine-parseable.
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let exit_code = match &cli.command {
        Commands::Allowlist(args) => commands::allowlist::run_allowlist(args),
        Commands::SancovStats(args) => commands::sancov::run_sancov_stats(args),
        Commands::ExtractMatrixTests(args) => commands::matrix::run_extract_matrix_tests(args),
        Commands::PickRandomTests(args) => commands::baseline::run_pick_random_tests(args),
        Commands::ChangedFunctions(args) => commands::statistics::run_changed_functions(args),
    };
    std::process::exit(i32::from(exit_code));
}
