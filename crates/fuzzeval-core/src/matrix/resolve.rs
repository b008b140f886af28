//! Matrix entry resolution with prefix-tolerant commit matching.
//!
//! Matrices come from heterogeneous producers: some store full commit hashes
//! and numeric job ids, others abbreviated hashes and textual ids. The
//! resolver tolerates both through two loose comparison rules, kept as
//! separate predicates:
//!
//! - [`commit_matches`]: equality, or either side is a prefix of the other
//! - [`job_id_matches`]: text-form equality ([`job_id_text_matches`]) or
//!   numeric equality ([`job_id_numeric_matches`])
//!
//! Entries that do not have the expected shape are skipped with a warning.
//! The first entry matching both rules wins.
//!
//! An empty commit is a prefix of every commit, so an empty query matches
//! every entry. Callers should reject empty commits before resolving.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{JobId, MatrixEntry, TestId};

/// Errors that can occur while resolving a matrix entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// The document has no `include` list.
    #[error("matrix is missing the 'include' field")]
    MissingInclude,

    /// No entry matched the commit and job id.
    #[error("could not find test data for commit {commit}, job_id {job_id}")]
    NotFound {
        /// The queried commit.
        commit: String,
        /// The queried job id.
        job_id: String,
    },

    /// No job matched the job id (commit-less resolution).
    #[error("could not find test data for job_id {job_id}")]
    JobNotFound {
        /// The queried job id.
        job_id: String,
    },
}

/// Returns true if `entry_commit` and `query` name the same revision.
///
/// Either side may be an abbreviation of the other.
#[must_use]
pub fn commit_matches(entry_commit: &str, query: &str) -> bool {
    entry_commit == query || entry_commit.starts_with(query) || query.starts_with(entry_commit)
}

/// Returns true if the text form of `stored` equals `query`.
#[must_use]
pub fn job_id_text_matches(stored: &JobId, query: &str) -> bool {
    match stored {
        JobId::Number(n) => n.to_string() == query,
        JobId::Text(s) => s == query,
    }
}

/// Returns true if `query` parses as an integer equal to the integral value
/// of a numeric `stored`.
///
/// Surrounding whitespace in the query is ignored. Textual and fractional
/// stored ids never match numerically.
#[must_use]
pub fn job_id_numeric_matches(stored: &JobId, query: &str) -> bool {
    match (stored.integral_value(), query.trim().parse::<i128>()) {
        (Some(n), Ok(q)) => n == q,
        _ => false,
    }
}

/// Returns true if either job id comparison accepts the pair.
#[must_use]
pub fn job_id_matches(stored: &JobId, query: &str) -> bool {
    job_id_text_matches(stored, query) || job_id_numeric_matches(stored, query)
}

/// Debugging aid computed when resolution fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionDiagnostics {
    /// Distinct commits present in the matrix.
    pub commits: BTreeSet<String>,
    /// Job ids of entries whose commit matches the query.
    pub job_ids: BTreeSet<JobId>,
}

/// A job record in a baseline artifact, with a tolerant job id.
#[derive(Deserialize)]
struct BaselineEntry {
    job_id: JobId,
    tests: Vec<TestId>,
}

/// Read-only view over the `include` list of a job matrix document.
#[derive(Debug, Clone, Copy)]
pub struct MatrixResolver<'a> {
    entries: &'a [Value],
}

impl<'a> MatrixResolver<'a> {
    /// Locates the `include` list in `doc`.
    ///
    /// Accepts both a bare matrix (`{"include": [...]}`) and a baseline
    /// artifact (`{"matrix": {"include": [...]}, ...}`).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingInclude`] if no `include` array is
    /// present.
    pub fn new(doc: &'a Value) -> Result<Self, ResolveError> {
        let include = doc
            .get("include")
            .or_else(|| doc.get("matrix").and_then(|matrix| matrix.get("include")));

        match include.and_then(Value::as_array) {
            Some(entries) => Ok(Self { entries }),
            None => Err(ResolveError::MissingInclude),
        }
    }

    /// Number of raw entries, well-formed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the `include` list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the tests of the first entry matching `commit` and `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] if no entry matches.
    pub fn resolve(&self, commit: &str, job_id: &str) -> Result<Vec<TestId>, ResolveError> {
        for (index, raw) in self.entries.iter().enumerate() {
            let entry = match MatrixEntry::deserialize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed matrix entry");
                    continue;
                },
            };

            if !commit_matches(&entry.commit, commit) {
                continue;
            }
            if job_id_matches(&entry.fuzzer_job.job_id, job_id) {
                debug!(
                    index,
                    commit = %entry.commit,
                    job_id = %entry.fuzzer_job.job_id,
                    tests = entry.fuzzer_job.tests.len(),
                    "resolved matrix entry"
                );
                return Ok(entry.fuzzer_job.tests);
            }
        }

        Err(ResolveError::NotFound {
            commit: commit.to_string(),
            job_id: job_id.to_string(),
        })
    }

    /// Returns the tests of the first job matching `job_id`, ignoring
    /// commits.
    ///
    /// Used for baseline artifacts, where one matrix covers one run.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::JobNotFound`] if no job matches.
    pub fn resolve_job(&self, job_id: &str) -> Result<Vec<TestId>, ResolveError> {
        for (index, raw) in self.entries.iter().enumerate() {
            let entry = match BaselineEntry::deserialize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed job entry");
                    continue;
                },
            };

            if job_id_matches(&entry.job_id, job_id) {
                return Ok(entry.tests);
            }
        }

        Err(ResolveError::JobNotFound {
            job_id: job_id.to_string(),
        })
    }

    /// Collects the commits present and the job ids available for `commit`.
    ///
    /// Entries only need a textual `commit` to be listed; a job id is listed
    /// when the entry's `fuzzer_job.job_id` is a number or text.
    #[must_use]
    pub fn diagnose(&self, commit: &str) -> ResolutionDiagnostics {
        let mut diagnostics = ResolutionDiagnostics::default();

        for raw in self.entries {
            let Some(entry_commit) = raw.get("commit").and_then(Value::as_str) else {
                continue;
            };
            diagnostics.commits.insert(entry_commit.to_string());

            if !commit_matches(entry_commit, commit) {
                continue;
            }
            let job_id = raw
                .get("fuzzer_job")
                .and_then(|job| job.get("job_id"))
                .and_then(|id| JobId::deserialize(id).ok());
            if let Some(job_id) = job_id {
                diagnostics.job_ids.insert(job_id);
            }
        }

        diagnostics
    }
}
