//! Subcommand implementations.
//!
//! Each `run_*` entry point returns a process exit code. Failures are
//! reported as a single `Error: ...` line (with the full context chain) on
//! stderr.

pub mod allowlist;
pub mod baseline;
pub mod matrix;
pub mod sancov;
pub mod statistics;

use clap::ValueEnum;
use fuzzeval_core::Solver;

/// Exit codes shared by all subcommands.
pub mod exit_codes {
    /// Success exit code.
    pub const SUCCESS: u8 = 0;
    /// Any IO, parse, or not-found failure.
    pub const ERROR: u8 = 1;
}

/// Solver selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SolverArg {
    /// cvc5 (tests from ctest).
    Cvc5,
    /// Z3 (tests from z3test).
    Z3,
}

impl From<SolverArg> for Solver {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Cvc5 => Self::Cvc5,
            SolverArg::Z3 => Self::Z3,
        }
    }
}

/// Prints an error line to stderr and returns the failure exit code.
pub fn report_error(message: &str) -> u8 {
    eprintln!("Error: {message}");
    exit_codes::ERROR
}

/// Converts a command result into an exit code.
pub fn finish(result: anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => report_error(&format!("{e:#}")),
    }
}
