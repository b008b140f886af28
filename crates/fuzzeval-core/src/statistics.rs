//! Per-commit fuzzing statistics.
//!
//! Fuzzing runs upload gzip-compressed JSON statistics to the object store,
//! one file per (solver, variant, commit). The statistics list the functions
//! changed by the commit under `functions[].function_id`.

use std::fmt;
use std::io::Read;

use flate2::read::GzDecoder;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::solver::Solver;

/// Variant whose statistics carry the changed-function list.
pub const DEFAULT_VARIANT: &str = "variant1";

/// Errors that can occur while decoding fuzzing statistics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatisticsError {
    /// The blob is not valid gzip.
    #[error("failed to decompress statistics: {0}")]
    Decompress(#[from] std::io::Error),

    /// The decompressed content is not valid JSON.
    #[error("invalid statistics JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Object key of a statistics blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsKey {
    /// Solver the statistics belong to.
    pub solver: Solver,
    /// Fuzzing variant.
    pub variant: String,
    /// Commit hash the run fuzzed.
    pub commit: String,
}

impl StatisticsKey {
    /// Key for the default variant.
    #[must_use]
    pub fn new(solver: Solver, commit: &str) -> Self {
        Self {
            solver,
            variant: DEFAULT_VARIANT.to_string(),
            commit: commit.to_string(),
        }
    }
}

impl fmt::Display for StatisticsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluation/rq2/{}/fuzzing-statistics/{}/fuzzing_statistics-{}.json.gz",
            self.solver, self.variant, self.commit
        )
    }
}

/// Decompresses a gzip blob and parses it as JSON.
///
/// # Errors
///
/// Returns [`StatisticsError::Decompress`] for invalid gzip data and
/// [`StatisticsError::Parse`] for invalid JSON.
pub fn decode_gzip_json(bytes: &[u8]) -> Result<Value, StatisticsError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder.read_to_string(&mut content)?;
    Ok(serde_json::from_str(&content)?)
}

/// Returns the `function_id` of every entry in `functions` that has one.
#[must_use]
pub fn extract_changed_functions(stats: &Value) -> Vec<Value> {
    stats
        .get("functions")
        .and_then(Value::as_array)
        .map(|functions| {
            functions
                .iter()
                .filter_map(|function| function.get("function_id").cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Changed functions for one commit, as printed by `changed-functions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedFunctions {
    /// Commit the statistics belong to.
    pub commit_hash: String,
    /// Function ids in statistics order.
    pub changed_functions: Vec<Value>,
    /// Number of changed functions.
    pub total_functions: usize,
}

impl ChangedFunctions {
    /// Extracts the changed functions of `commit` from decoded statistics.
    #[must_use]
    pub fn from_statistics(commit: &str, stats: &Value) -> Self {
        let changed_functions = extract_changed_functions(stats);
        Self {
            commit_hash: commit.to_string(),
            total_functions: changed_functions.len(),
            changed_functions,
        }
    }
}
