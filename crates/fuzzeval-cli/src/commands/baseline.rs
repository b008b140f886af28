//! `pick-random-tests` command.
//!
//! Discovers every test of the selected solver (ctest for cvc5, z3test
//! benchmarks for Z3), shuffles the corpus with a fixed seed, and writes the
//! resulting job matrix for baseline fuzzing.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use fuzzeval_core::Solver;
use fuzzeval_core::discovery::{CtestSource, TestSource, Z3TestSource};
use fuzzeval_core::matrix::{BaselineMatrix, DEFAULT_SEED, DEFAULT_SHARD_COUNT, partition};
use tracing::info;

use super::{SolverArg, finish};

/// Arguments for the `pick-random-tests` command.
#[derive(Debug, Args)]
pub struct PickRandomTestsArgs {
    /// Solver whose tests to pick
    #[arg(long, value_enum)]
    pub solver: SolverArg,

    /// Build directory with ctest (for cvc5)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// z3test directory (for Z3)
    #[arg(long)]
    pub z3test_dir: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of jobs to split the corpus into
    #[arg(long, default_value_t = DEFAULT_SHARD_COUNT, value_parser = parse_job_count)]
    pub jobs: usize,

    /// Output JSON file for the job matrix
    #[arg(long)]
    pub output: PathBuf,
}

/// Runs the `pick-random-tests` command.
pub fn run_pick_random_tests(args: &PickRandomTestsArgs) -> u8 {
    finish(pick_random_tests(args))
}

fn parse_job_count(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(e) => Err(e.to_string()),
    }
}

fn test_source(args: &PickRandomTestsArgs) -> Result<Box<dyn TestSource>> {
    let source: Box<dyn TestSource> = match Solver::from(args.solver) {
        Solver::Cvc5 => {
            let Some(build_dir) = &args.build_dir else {
                bail!("--build-dir is required for cvc5");
            };
            info!(build_dir = %build_dir.display(), "discovering tests from ctest");
            Box::new(CtestSource::new(build_dir))
        },
        Solver::Z3 => {
            let Some(z3test_dir) = &args.z3test_dir else {
                bail!("--z3test-dir is required for z3");
            };
            info!(z3test_dir = %z3test_dir.display(), "discovering tests from z3test");
            Box::new(Z3TestSource::new(z3test_dir))
        },
    };
    Ok(source)
}

fn pick_random_tests(args: &PickRandomTestsArgs) -> Result<()> {
    let tests = test_source(args)?
        .list_tests()
        .context("test discovery failed")?;
    info!(count = tests.len(), "found tests");

    let matrix = partition(&tests, args.jobs, args.seed).context("failed to partition tests")?;
    let artifact = BaselineMatrix::from_matrix(matrix);
    info!(
        tests = artifact.total_tests,
        seed = args.seed,
        "shuffled tests in random order"
    );

    let content = serde_json::to_string_pretty(&artifact)?;
    std::fs::write(&args.output, content)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        tests = artifact.total_tests,
        jobs = artifact.total_jobs,
        tests_per_job = artifact.tests_per_job,
        "wrote baseline matrix"
    );
    Ok(())
}
