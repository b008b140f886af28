//! `changed-functions` command.
//!
//! Downloads the gzip-compressed fuzzing statistics of a commit and prints
//! the functions it changed. A missing statistics object is reported
//! separately from transport failures: it only means the fuzzing run has not
//! published its results yet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fuzzeval_core::Solver;
use fuzzeval_core::config::StoreConfig;
use fuzzeval_core::statistics::{
    ChangedFunctions, DEFAULT_VARIANT, StatisticsKey, decode_gzip_json,
};
use fuzzeval_core::store::{AwsCliStore, DirectoryStore, FetchError, ObjectStore};
use tracing::info;

use super::{SolverArg, exit_codes, finish, report_error};

/// Arguments for the `changed-functions` command.
#[derive(Debug, Args)]
pub struct ChangedFunctionsArgs {
    /// Solver whose statistics to read
    #[arg(value_enum)]
    pub solver: SolverArg,

    /// Commit hash whose statistics to read
    pub commit_hash: String,

    /// Fuzzing variant that published the statistics
    #[arg(long, default_value = DEFAULT_VARIANT)]
    pub variant: String,

    /// Read from a local mirror of the bucket instead of S3
    #[arg(long)]
    pub mirror_dir: Option<PathBuf>,
}

/// Runs the `changed-functions` command.
pub fn run_changed_functions(args: &ChangedFunctionsArgs) -> u8 {
    let store = match open_store(args) {
        Ok(store) => store,
        Err(e) => return report_error(&format!("{e:#}")),
    };
    let key = StatisticsKey {
        variant: args.variant.clone(),
        ..StatisticsKey::new(Solver::from(args.solver), &args.commit_hash)
    }
    .to_string();

    let download = match tempfile::Builder::new().suffix(".json.gz").tempfile() {
        Ok(file) => file,
        Err(e) => return report_error(&format!("failed to create temporary file: {e}")),
    };

    info!(location = %store.location(&key), "downloading {} statistics", args.variant);
    match store.fetch(&key, download.path()) {
        Ok(()) => finish(print_changed_functions(args, download.path())),
        Err(FetchError::NotFound { .. }) => {
            eprintln!(
                "{} statistics not found for commit {}",
                args.variant, args.commit_hash
            );
            exit_codes::ERROR
        },
        Err(e) => report_error(&format!("downloading statistics: {e}")),
    }
}

fn open_store(args: &ChangedFunctionsArgs) -> Result<Box<dyn ObjectStore>> {
    if let Some(mirror_dir) = &args.mirror_dir {
        return Ok(Box::new(DirectoryStore::new(mirror_dir)));
    }
    let config = StoreConfig::from_env()?;
    Ok(Box::new(AwsCliStore::new(config)))
}

fn print_changed_functions(args: &ChangedFunctionsArgs, path: &std::path::Path) -> Result<()> {
    let bytes = std::fs::read(path).context("failed to read downloaded statistics")?;
    let stats = decode_gzip_json(&bytes)?;
    let report = ChangedFunctions::from_statistics(&args.commit_hash, &stats);

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(count = report.total_functions, "extracted changed functions");
    Ok(())
}
