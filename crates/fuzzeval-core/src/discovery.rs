//! Test corpus discovery.
//!
//! Each solver registers its regression tests differently:
//!
//! | Solver | Source | Test id |
//! |--------|--------|---------|
//! | cvc5 | `ctest --show-only` in the build directory | ctest test name |
//! | Z3 | `*.smt*` files under `z3test/regressions` | path relative to `z3test` |
//!
//! Both sources implement [`TestSource`]. ctest output is listed in ctest
//! order; z3test files are sorted so the corpus order is stable before
//! shuffling.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;
use xshell::{Shell, cmd};

use crate::matrix::TestId;

/// Matches one test line of `ctest --show-only`, e.g. `Test #12: regress0/bug1`.
static CTEST_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Test\s+#\d+:\s*(.+)").expect("ctest line regex is valid"));

/// Directory under the z3test checkout holding regression benchmarks.
pub const Z3TEST_REGRESSIONS_DIR: &str = "regressions";

/// Suffix of marker files that disable a z3test benchmark.
const DISABLED_SUFFIX: &str = ".disabled";

/// Errors that can occur while enumerating tests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// A required directory does not exist.
    #[error("directory not found: {}", path.display())]
    MissingDirectory {
        /// The missing directory.
        path: PathBuf,
    },

    /// Walking the filesystem failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The test lister could not be started.
    #[error("failed to run test lister: {0}")]
    Spawn(String),

    /// The test lister exited unsuccessfully.
    #[error("ctest failed with {status}: {stderr}")]
    CommandFailed {
        /// Exit status of the lister.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },

    /// The test lister printed nothing.
    #[error("ctest returned empty output")]
    EmptyListing,
}

/// A source of test identifiers.
pub trait TestSource {
    /// Enumerates the corpus.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] if the corpus cannot be enumerated.
    fn list_tests(&self) -> Result<Vec<TestId>, DiscoveryError>;
}

/// Parses the human-readable output of `ctest --show-only`.
///
/// Lines that do not look like `Test #N: name` are ignored.
#[must_use]
pub fn parse_ctest_listing(output: &str) -> Vec<TestId> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| CTEST_LINE_REGEX.captures(line))
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().trim())
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Tests registered with ctest in a cvc5 build directory.
///
/// Uses `--show-only` so test executables need not exist.
#[derive(Debug, Clone)]
pub struct CtestSource {
    build_dir: PathBuf,
}

impl CtestSource {
    /// Creates a source for `build_dir`.
    #[must_use]
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
        }
    }
}

impl TestSource for CtestSource {
    fn list_tests(&self) -> Result<Vec<TestId>, DiscoveryError> {
        if !self.build_dir.is_dir() {
            return Err(DiscoveryError::MissingDirectory {
                path: self.build_dir.clone(),
            });
        }

        let sh = Shell::new().map_err(|e| DiscoveryError::Spawn(e.to_string()))?;
        sh.change_dir(&self.build_dir);

        let output = cmd!(sh, "ctest --show-only")
            .quiet()
            .ignore_status()
            .output()
            .map_err(|e| DiscoveryError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(DiscoveryError::CommandFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(DiscoveryError::EmptyListing);
        }

        let tests = parse_ctest_listing(&stdout);
        debug!(count = tests.len(), build_dir = %self.build_dir.display(), "listed ctest tests");
        Ok(tests)
    }
}

/// SMT-LIB benchmarks in a z3test checkout.
#[derive(Debug, Clone)]
pub struct Z3TestSource {
    z3test_dir: PathBuf,
}

impl Z3TestSource {
    /// Creates a source for the z3test checkout at `z3test_dir`.
    #[must_use]
    pub fn new(z3test_dir: impl Into<PathBuf>) -> Self {
        Self {
            z3test_dir: z3test_dir.into(),
        }
    }
}

impl TestSource for Z3TestSource {
    fn list_tests(&self) -> Result<Vec<TestId>, DiscoveryError> {
        if !self.z3test_dir.is_dir() {
            return Err(DiscoveryError::MissingDirectory {
                path: self.z3test_dir.clone(),
            });
        }
        let regressions = self.z3test_dir.join(Z3TEST_REGRESSIONS_DIR);
        if !regressions.is_dir() {
            return Err(DiscoveryError::MissingDirectory { path: regressions });
        }

        let mut files = Vec::new();
        collect_benchmarks(&regressions, &mut files)?;

        let mut tests: Vec<TestId> = files
            .iter()
            .filter_map(|path| path.strip_prefix(&self.z3test_dir).ok())
            .map(|relative| relative.to_string_lossy().into_owned())
            .collect();
        tests.sort();

        debug!(count = tests.len(), z3test_dir = %self.z3test_dir.display(), "listed z3test benchmarks");
        Ok(tests)
    }
}

/// Returns true for `*.smt*` names that are not `.disabled` markers.
fn is_benchmark_name(name: &str) -> bool {
    name.contains(".smt") && !name.ends_with(DISABLED_SUFFIX)
}

fn collect_benchmarks(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DiscoveryError> {
    let io_error = |source: io::Error| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error)?;

        if file_type.is_dir() {
            collect_benchmarks(&path, out)?;
        } else if path.is_file() && is_benchmark_name(&entry.file_name().to_string_lossy()) {
            out.push(path);
        }
    }
    Ok(())
}
