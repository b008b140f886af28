//! `sancov-stats` command.
//!
//! Formats the statistics of a single coverage file, or compares several
//! runs with `--compare`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use fuzzeval_core::coverage::{CoverageReport, OutputFormat, compare, format_stats};
use fuzzeval_core::input::load_json;

use super::finish;

/// Arguments for the `sancov-stats` command.
#[derive(Debug, Args)]
pub struct SancovStatsArgs {
    /// Coverage JSON file from the sancov coverage tracker
    pub coverage_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Compare coverage across multiple files
    #[arg(long, num_args = 1.., value_name = "FILE")]
    pub compare: Vec<PathBuf>,
}

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable report.
    Text,
    /// Pretty-printed JSON.
    Json,
    /// `test_id,unique_pcs` rows.
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Csv => Self::Csv,
        }
    }
}

/// Runs the `sancov-stats` command.
pub fn run_sancov_stats(args: &SancovStatsArgs) -> u8 {
    finish(print_stats(args))
}

fn print_stats(args: &SancovStatsArgs) -> Result<()> {
    let format = OutputFormat::from(args.format);

    let output = match &args.coverage_file {
        _ if !args.compare.is_empty() => {
            let runs = args
                .compare
                .iter()
                .map(|path| load_report(path).map(|report| (run_name(path), report)))
                .collect::<Result<Vec<_>>>()?;
            compare(&runs, format)?
        },
        Some(path) => format_stats(&load_report(path)?, format)?,
        None => bail!("a coverage file or --compare FILE... is required"),
    };

    println!("{output}");
    Ok(())
}

fn load_report(path: &Path) -> Result<CoverageReport> {
    load_json(path).context("failed to load coverage file")
}

/// Names a run after its coverage file, without the extension.
fn run_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_name_uses_file_stem() {
        assert_eq!(run_name(Path::new("/runs/baseline.json")), "baseline");
        assert_eq!(run_name(Path::new("variant1")), "variant1");
    }
}
