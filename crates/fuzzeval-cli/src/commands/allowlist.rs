//! `allowlist` command.
//!
//! Reads the `function_info_map` written by the commit fuzzer preparation
//! step and writes a sancov allowlist for the changed functions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fuzzeval_core::allowlist::{Allowlist, DEFAULT_SOURCE_ROOT};
use fuzzeval_core::input::load_json;
use serde_json::Value;
use tracing::info;

use super::finish;

/// Arguments for the `allowlist` command.
#[derive(Debug, Args)]
pub struct AllowlistArgs {
    /// JSON file from the commit fuzzer preparation (must contain
    /// `function_info_map`)
    pub input_json: PathBuf,

    /// Output allowlist file
    #[arg(short, long, default_value = "coverage_allowlist.txt")]
    pub output: PathBuf,

    /// Source root that allowlist paths are anchored at
    #[arg(long, default_value = DEFAULT_SOURCE_ROOT)]
    pub source_root: String,
}

/// Runs the `allowlist` command.
pub fn run_allowlist(args: &AllowlistArgs) -> u8 {
    finish(generate(args))
}

fn generate(args: &AllowlistArgs) -> Result<()> {
    let doc: Value = load_json(&args.input_json).context("failed to load input")?;
    let allowlist = Allowlist::from_document(&doc, &args.source_root)
        .with_context(|| format!("cannot build allowlist from {}", args.input_json.display()))?;

    std::fs::write(&args.output, allowlist.render())
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(output = %args.output.display(), "allowlist written");
    println!(
        "Generated allowlist with {} functions across {} files",
        allowlist.function_count(),
        allowlist.file_count()
    );
    println!("Output written to: {}", args.output.display());
    Ok(())
}
