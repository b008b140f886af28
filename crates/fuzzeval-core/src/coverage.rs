//! Sancov coverage statistics.
//!
//! Reads the JSON written by the sancov coverage tracker and renders it in a
//! form that can be compared across fuzzing runs. The tracker output looks
//! like:
//!
//! ```json
//! {
//!   "stats": {"processed_files": 12},
//!   "covered_pcs": ["0x4a3f10", "0x4a3f2c"],
//!   "test_coverage": {"regress0/bug123.smt2": ["0x4a3f10"]}
//! }
//! ```
//!
//! `covered_pcs` may be a list or a map keyed by PC; only its size matters.
//! Per-test output follows document order except in the text report, which
//! sorts tests by PC count.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const RULE: &str = "========================================";
const THIN_RULE: &str = "----------------------------------------";

/// Errors that can occur while formatting coverage statistics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoverageError {
    /// Unknown output format name.
    #[error("unknown output format '{0}' (expected text, json, or csv)")]
    UnknownFormat(String),

    /// JSON serialization failed.
    #[error("failed to serialize coverage statistics: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Output format for coverage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable report.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// `test_id,unique_pcs` rows.
    Csv,
}

impl FromStr for OutputFormat {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(CoverageError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

/// Tracker bookkeeping.
///
/// `processed_files` is reported verbatim, whatever JSON value the tracker
/// wrote; a missing count reads as 0.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerStats {
    /// Number of `.sancov` files processed.
    #[serde(default = "zero")]
    pub processed_files: Value,
}

impl Default for TrackerStats {
    fn default() -> Self {
        Self {
            processed_files: zero(),
        }
    }
}

fn zero() -> Value {
    Value::from(0)
}

/// Renders a JSON scalar the way it appears in text reports.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coverage data for one fuzzing run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageReport {
    /// Tracker bookkeeping.
    #[serde(default)]
    pub stats: TrackerStats,
    /// All covered PCs, as a list or a map.
    #[serde(default)]
    pub covered_pcs: Value,
    /// Covered PCs per test, in document order.
    #[serde(default)]
    pub test_coverage: Map<String, Value>,
}

impl CoverageReport {
    /// Number of unique covered PCs.
    #[must_use]
    pub fn total_pcs(&self) -> usize {
        collection_len(&self.covered_pcs)
    }

    /// Number of tests with coverage data.
    #[must_use]
    pub fn tests_tracked(&self) -> usize {
        self.test_coverage.len()
    }

    /// Per-test PC counts in document order.
    #[must_use]
    pub fn coverage_by_test(&self) -> Vec<(&str, usize)> {
        self.test_coverage
            .iter()
            .map(|(test, pcs)| (test.as_str(), collection_len(pcs)))
            .collect()
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            total_pcs: self.total_pcs(),
            tests_tracked: self.tests_tracked(),
            processed_files: self.stats.processed_files.clone(),
        }
    }
}

fn collection_len(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

#[derive(Serialize)]
struct RunSummary {
    total_pcs: usize,
    tests_tracked: usize,
    processed_files: Value,
}

#[derive(Serialize)]
struct StatsDocument {
    #[serde(flatten)]
    summary: RunSummary,
    coverage_by_test: Map<String, Value>,
}

/// Formats the statistics of one run.
///
/// # Errors
///
/// Returns [`CoverageError::Serialize`] if JSON rendering fails.
pub fn format_stats(report: &CoverageReport, format: OutputFormat) -> Result<String, CoverageError> {
    let by_test = report.coverage_by_test();

    match format {
        OutputFormat::Json => {
            let coverage_by_test = by_test
                .iter()
                .map(|(test, count)| ((*test).to_string(), Value::from(*count)))
                .collect();
            let doc = StatsDocument {
                summary: report.summary(),
                coverage_by_test,
            };
            Ok(serde_json::to_string_pretty(&doc)?)
        },
        OutputFormat::Csv => {
            let mut lines = vec!["test_id,unique_pcs".to_string()];
            lines.extend(by_test.iter().map(|(test, count)| format!("{test},{count}")));
            Ok(lines.join("\n"))
        },
        OutputFormat::Text => {
            let mut lines = vec![
                "Sancov Coverage Statistics".to_string(),
                RULE.to_string(),
                format!("Total unique PCs: {}", report.total_pcs()),
                format!("Tests tracked: {}", report.tests_tracked()),
                format!(
                    "Processed .sancov files: {}",
                    display_value(&report.stats.processed_files)
                ),
                String::new(),
                "Coverage by test:".to_string(),
                THIN_RULE.to_string(),
            ];

            let mut sorted = by_test;
            sorted.sort_by(|a, b| b.1.cmp(&a.1));
            lines.extend(
                sorted
                    .iter()
                    .map(|(test, count)| format!("  {test}: {count} PCs")),
            );
            Ok(lines.join("\n"))
        },
    }
}

/// Compares several named runs.
///
/// JSON output is an object keyed by run name; every other format produces
/// the text comparison.
///
/// # Errors
///
/// Returns [`CoverageError::Serialize`] if JSON rendering fails.
pub fn compare(runs: &[(String, CoverageReport)], format: OutputFormat) -> Result<String, CoverageError> {
    if format == OutputFormat::Json {
        let mut comparison = Map::new();
        for (name, report) in runs {
            comparison.insert(name.clone(), serde_json::to_value(report.summary())?);
        }
        return Ok(serde_json::to_string_pretty(&comparison)?);
    }

    let mut lines = vec!["Coverage Comparison".to_string(), RULE.to_string()];
    for (name, report) in runs {
        lines.push(format!("\n{name}:"));
        lines.push(format!("  Total PCs: {}", report.total_pcs()));
        lines.push(format!("  Tests tracked: {}", report.tests_tracked()));
        lines.push(format!(
            "  Processed files: {}",
            display_value(&report.stats.processed_files)
        ));
    }
    Ok(lines.join("\n"))
}
