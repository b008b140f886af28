//! `extract-matrix-tests` command.
//!
//! Resolves the test list of one CI shard from a fuzzing matrix and prints
//! it as compact JSON. When nothing matches, the commits present in the
//! matrix and the job ids available for the queried commit are printed to
//! help debugging.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use fuzzeval_core::input::load_json;
use fuzzeval_core::matrix::{MatrixResolver, ResolutionDiagnostics, ResolveError};
use serde_json::Value;

use super::{exit_codes, finish, report_error};

/// Number of commits and job ids shown when resolution fails.
const MAX_DIAGNOSTIC_ITEMS: usize = 5;

/// Arguments for the `extract-matrix-tests` command.
#[derive(Debug, Args)]
pub struct ExtractMatrixTestsArgs {
    /// Matrix JSON file
    pub matrix_file: PathBuf,

    /// Commit hash (full or abbreviated)
    pub commit: String,

    /// Job id within the commit
    pub job_id: String,

    /// Resolve against a baseline matrix by job id alone; the commit only
    /// labels the run
    #[arg(long)]
    pub baseline: bool,
}

/// Runs the `extract-matrix-tests` command.
pub fn run_extract_matrix_tests(args: &ExtractMatrixTestsArgs) -> u8 {
    let doc = match load_matrix(args) {
        Ok(doc) => doc,
        Err(e) => return report_error(&format!("{e:#}")),
    };
    let resolver = match MatrixResolver::new(&doc) {
        Ok(resolver) => resolver,
        Err(e) => {
            return report_error(&format!(
                "{e} in {}",
                args.matrix_file.display()
            ));
        },
    };

    let resolved = if args.baseline {
        resolver.resolve_job(&args.job_id)
    } else {
        resolver.resolve(&args.commit, &args.job_id)
    };

    match resolved {
        Ok(tests) => finish(print_tests(&tests)),
        Err(ResolveError::NotFound { commit, job_id }) => {
            report_not_found(&commit, &job_id, &resolver.diagnose(&commit))
        },
        Err(e) => report_error(&e.to_string()),
    }
}

fn load_matrix(args: &ExtractMatrixTestsArgs) -> Result<Value> {
    // An empty commit is a prefix of every commit and would match any entry.
    if !args.baseline && args.commit.trim().is_empty() {
        bail!("commit must not be empty");
    }
    load_json(&args.matrix_file).context("failed to load matrix file")
}

fn print_tests(tests: &[String]) -> Result<()> {
    println!("{}", serde_json::to_string(tests)?);
    Ok(())
}

fn report_not_found(commit: &str, job_id: &str, diagnostics: &ResolutionDiagnostics) -> u8 {
    eprintln!("Error: Could not find test data for commit {commit}, job_id {job_id}");

    let commits: Vec<&str> = diagnostics
        .commits
        .iter()
        .take(MAX_DIAGNOSTIC_ITEMS)
        .map(String::as_str)
        .collect();
    eprintln!("Available commits in matrix: {commits:?}");

    if !diagnostics.job_ids.is_empty() {
        let job_ids: Vec<String> = diagnostics
            .job_ids
            .iter()
            .take(MAX_DIAGNOSTIC_ITEMS)
            .map(ToString::to_string)
            .collect();
        eprintln!("Available job_ids for this commit: {job_ids:?}");
    }

    exit_codes::ERROR
}
