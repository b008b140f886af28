//! Job matrices: test-corpus partitioning and matrix entry resolution.
//!
//! A job matrix describes how a test corpus is split into independent CI
//! shards. Two related schemas share the "matrix with an `include` list"
//! convention:
//!
//! - The **baseline** artifact written by [`partition`]: `include` holds
//!   [`Job`] records (`job_id` + `tests`), wrapped in a [`BaselineMatrix`]
//!   together with summary counts.
//! - The **upstream** schema produced by the commit fuzzer: `include` holds
//!   [`MatrixEntry`] records (`commit` + `fuzzer_job`), whose job ids may be
//!   numbers or text.
//!
//! The partitioner runs once per baseline run; the resolver runs once per
//! CI shard to recover the tests for a (commit, job) pair. Both are pure
//! functions of their inputs.
//!
//! # Invariants
//!
//! - [INV-MATRIX-001] Shard sizes come from ceiling division: every shard
//!   holds `ceil(T / J)` tests except possibly the last, which is never empty
//! - [INV-MATRIX-002] Identical corpus and seed produce an identical
//!   partition
//! - [INV-MATRIX-003] Resolution returns the first matching entry in
//!   `include` order and never mutates the matrix
//!
//! # Example
//!
//! ```
//! use fuzzeval_core::matrix::{BaselineMatrix, MatrixResolver, partition};
//!
//! let tests: Vec<String> = (0..10).map(|i| format!("regress/t{i}.smt2")).collect();
//! let matrix = partition(&tests, 4, 42).unwrap();
//! let artifact = BaselineMatrix::from_matrix(matrix);
//! assert_eq!(artifact.total_jobs, 4);
//! assert_eq!(artifact.tests_per_job, 3);
//!
//! let doc = serde_json::to_value(&artifact).unwrap();
//! let resolver = MatrixResolver::new(&doc).unwrap();
//! let shard = resolver.resolve_job("3").unwrap();
//! assert_eq!(shard.len(), 1);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

mod partition;
mod resolve;

pub use partition::{DEFAULT_SEED, DEFAULT_SHARD_COUNT, PartitionError, partition};
pub use resolve::{
    MatrixResolver, ResolutionDiagnostics, ResolveError, commit_matches, job_id_matches,
    job_id_numeric_matches, job_id_text_matches,
};

/// An opaque test identifier (file path or test-framework name).
pub type TestId = String;

/// One shard of a partitioned corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Position of the shard in the partition (0-based).
    pub job_id: usize,
    /// Tests assigned to the shard, in shuffled order.
    pub tests: Vec<TestId>,
}

/// A job matrix as emitted by the partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobMatrix {
    /// Shards in job id order.
    pub include: Vec<Job>,
}

/// The persisted baseline artifact: a job matrix plus summary counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineMatrix {
    /// The job matrix.
    pub matrix: JobMatrix,
    /// Number of tests across all jobs.
    pub total_tests: usize,
    /// Number of jobs in the matrix.
    pub total_jobs: usize,
    /// Size of every job except possibly the last.
    pub tests_per_job: usize,
}

impl BaselineMatrix {
    /// Wraps a job matrix and computes its summary counts.
    #[must_use]
    pub fn from_matrix(matrix: JobMatrix) -> Self {
        let total_tests = matrix.include.iter().map(|job| job.tests.len()).sum();
        let total_jobs = matrix.include.len();
        let tests_per_job = matrix.include.first().map_or(0, |job| job.tests.len());
        Self {
            matrix,
            total_tests,
            total_jobs,
            tests_per_job,
        }
    }
}

/// A job id as stored by upstream matrix producers: a number or text.
///
/// Any JSON number is accepted, including floats and integers outside the
/// `i64` range, so such entries stay resolvable by their text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    /// Numeric job id (`"job_id": 2`, `"job_id": 2.0`).
    Number(Number),
    /// Textual job id (`"job_id": "2"`).
    Text(String),
}

impl JobId {
    /// The integer value of a numeric id, if it is integral.
    ///
    /// `2` and `2.0` both yield 2; `2.5` and textual ids yield `None`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn integral_value(&self) -> Option<i128> {
        let Self::Number(n) = self else {
            return None;
        };
        if let Some(i) = n.as_i64() {
            return Some(i128::from(i));
        }
        if let Some(u) = n.as_u64() {
            return Some(i128::from(u));
        }
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i128)
    }
}

impl From<i64> for JobId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Ord for JobId {
    /// Numbers sort before text; numbers by value, then by text form.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.total_cmp(&y).then_with(|| a.to_string().cmp(&b.to_string()))
            },
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for JobId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The job half of an upstream matrix entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzerJob {
    /// Job id, numeric or textual.
    pub job_id: JobId,
    /// Tests assigned to the job.
    pub tests: Vec<TestId>,
}

/// One entry of an upstream job matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Full or abbreviated commit hash.
    pub commit: String,
    /// The job for this commit.
    pub fuzzer_job: FuzzerJob,
}
