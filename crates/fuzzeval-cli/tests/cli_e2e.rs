//! Subprocess tests for the `fuzzeval` binary.
//!
//! Every test runs the binary built by Cargo against fixtures in a
//! temporary directory. Nothing touches the network: `changed-functions` is
//! pointed at a local mirror with `--mirror-dir`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Value, json};

fn fuzzeval_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fuzzeval"))
}

fn run(args: &[&str]) -> Output {
    Command::new(fuzzeval_bin())
        .args(args)
        .env_remove("AWS_S3_BUCKET")
        .output()
        .expect("spawn fuzzeval")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn commit_matrix() -> Value {
    json!({
        "include": [
            {
                "commit": "abcdef1234567890",
                "fuzzer_job": { "job_id": 0, "tests": ["regress0/a.smt2", "regress0/b.smt2"] }
            },
            {
                "commit": "abcdef1234567890",
                "fuzzer_job": { "job_id": "1", "tests": ["regress1/c.smt2"] }
            },
            {
                "commit": "0123456789abcdef",
                "fuzzer_job": { "job_id": 0, "tests": ["regress2/d.smt2"] }
            }
        ]
    })
}

// =========================================================================
// extract-matrix-tests
// =========================================================================

#[test]
fn test_extract_matrix_tests_abbreviated_commit() {
    let tmp = tempfile::tempdir().unwrap();
    let matrix = write_json(tmp.path(), "matrix.json", &commit_matrix());

    let output = run(&[
        "extract-matrix-tests",
        matrix.to_str().unwrap(),
        "abcdef1",
        "0",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), r#"["regress0/a.smt2","regress0/b.smt2"]"#);
}

#[test]
fn test_extract_matrix_tests_text_job_id() {
    let tmp = tempfile::tempdir().unwrap();
    let matrix = write_json(tmp.path(), "matrix.json", &commit_matrix());

    let output = run(&[
        "extract-matrix-tests",
        matrix.to_str().unwrap(),
        "abcdef1234567890",
        "1",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), r#"["regress1/c.smt2"]"#);
}

#[test]
fn test_extract_matrix_tests_integral_float_job_id() {
    let tmp = tempfile::tempdir().unwrap();
    let matrix = write_json(
        tmp.path(),
        "matrix.json",
        &json!({"include": [
            {"commit": "abc123", "fuzzer_job": {"job_id": 2.0, "tests": ["regress0/f.smt2"]}}
        ]}),
    );

    let output = run(&["extract-matrix-tests", matrix.to_str().unwrap(), "abc123", "2"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), r#"["regress0/f.smt2"]"#);
}

#[test]
fn test_extract_matrix_tests_not_found_lists_diagnostics() {
    let tmp = tempfile::tempdir().unwrap();
    let matrix = write_json(tmp.path(), "matrix.json", &commit_matrix());

    let output = run(&[
        "extract-matrix-tests",
        matrix.to_str().unwrap(),
        "abcdef1",
        "7",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("Could not find test data for commit abcdef1, job_id 7"));
    assert!(err.contains("Available commits in matrix"));
    assert!(err.contains("0123456789abcdef"));
    assert!(err.contains("Available job_ids for this commit"));
}

#[test]
fn test_extract_matrix_tests_missing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.json");

    let output = run(&["extract-matrix-tests", missing.to_str().unwrap(), "abc", "0"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
}

#[test]
fn test_extract_matrix_tests_missing_include() {
    let tmp = tempfile::tempdir().unwrap();
    let matrix = write_json(tmp.path(), "matrix.json", &json!({ "jobs": [] }));

    let output = run(&["extract-matrix-tests", matrix.to_str().unwrap(), "abc", "0"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("include"));
}

#[test]
fn test_extract_matrix_tests_rejects_empty_commit() {
    let tmp = tempfile::tempdir().unwrap();
    let matrix = write_json(tmp.path(), "matrix.json", &commit_matrix());

    let output = run(&["extract-matrix-tests", matrix.to_str().unwrap(), "", "0"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}

// =========================================================================
// pick-random-tests
// =========================================================================

fn z3test_fixture(root: &Path) -> PathBuf {
    let regressions = root.join("z3test").join("regressions");
    std::fs::create_dir_all(regressions.join("smt2")).unwrap();
    for name in ["a.smt2", "b.smt2", "c.smt2", "d.smt", "e.smt2"] {
        std::fs::write(regressions.join("smt2").join(name), "(check-sat)\n").unwrap();
    }
    std::fs::write(regressions.join("smt2/skip.smt2.disabled"), "").unwrap();
    std::fs::write(regressions.join("README.md"), "").unwrap();
    root.join("z3test")
}

#[test]
fn test_pick_random_tests_then_extract_every_job() {
    let tmp = tempfile::tempdir().unwrap();
    let z3test = z3test_fixture(tmp.path());
    let out = tmp.path().join("baseline.json");

    let output = run(&[
        "pick-random-tests",
        "--solver",
        "z3",
        "--z3test-dir",
        z3test.to_str().unwrap(),
        "--jobs",
        "2",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let artifact: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(artifact["total_tests"], 5);
    assert_eq!(artifact["total_jobs"], 2);
    assert_eq!(artifact["tests_per_job"], 3);

    let mut recovered = Vec::new();
    for job_id in ["0", "1"] {
        let output = run(&[
            "extract-matrix-tests",
            out.to_str().unwrap(),
            "baseline",
            job_id,
            "--baseline",
        ]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let tests: Vec<String> = serde_json::from_str(stdout(&output).trim()).unwrap();
        recovered.extend(tests);
    }
    recovered.sort();
    assert_eq!(
        recovered,
        vec![
            "regressions/smt2/a.smt2",
            "regressions/smt2/b.smt2",
            "regressions/smt2/c.smt2",
            "regressions/smt2/d.smt",
            "regressions/smt2/e.smt2",
        ]
    );
}

#[test]
fn test_pick_random_tests_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let z3test = z3test_fixture(tmp.path());

    let mut artifacts = Vec::new();
    for name in ["first.json", "second.json"] {
        let out = tmp.path().join(name);
        let output = run(&[
            "pick-random-tests",
            "--solver",
            "z3",
            "--z3test-dir",
            z3test.to_str().unwrap(),
            "--seed",
            "7",
            "--output",
            out.to_str().unwrap(),
        ]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        artifacts.push(std::fs::read_to_string(&out).unwrap());
    }

    assert_eq!(artifacts[0], artifacts[1]);
}

#[test]
fn test_pick_random_tests_requires_source_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("baseline.json");

    let output = run(&[
        "pick-random-tests",
        "--solver",
        "cvc5",
        "--output",
        out.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--build-dir"));
    assert!(!out.exists());
}

#[test]
fn test_pick_random_tests_empty_corpus() {
    let tmp = tempfile::tempdir().unwrap();
    let regressions = tmp.path().join("z3test/regressions/smt2");
    std::fs::create_dir_all(&regressions).unwrap();
    std::fs::write(regressions.join("bug.smt2.disabled"), "").unwrap();
    std::fs::write(regressions.join("notes.txt"), "").unwrap();
    let out = tmp.path().join("baseline.json");

    let output = run(&[
        "pick-random-tests",
        "--solver",
        "z3",
        "--z3test-dir",
        tmp.path().join("z3test").to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("empty test corpus"), "stderr: {}", stderr(&output));
    assert!(!out.exists());
}

#[test]
fn test_pick_random_tests_rejects_zero_jobs() {
    let tmp = tempfile::tempdir().unwrap();
    let z3test = z3test_fixture(tmp.path());
    let out = tmp.path().join("baseline.json");

    let output = run(&[
        "pick-random-tests",
        "--solver",
        "z3",
        "--z3test-dir",
        z3test.to_str().unwrap(),
        "--jobs",
        "0",
        "--output",
        out.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("must be at least 1"));
    assert!(!out.exists());
}

#[test]
fn test_pick_random_tests_rejects_unknown_solver() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("baseline.json");

    let output = run(&[
        "pick-random-tests",
        "--solver",
        "yices",
        "--output",
        out.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("yices"));
    assert!(!out.exists());
}

// =========================================================================
// allowlist
// =========================================================================

#[test]
fn test_allowlist_writes_sancov_file() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_json(
        tmp.path(),
        "changed.json",
        &json!({
            "function_info_map": {
                "f1": { "mangled_name": "_ZN4cvc53fooEv", "file": "/home/ci/cvc5/src/theory/foo.cpp" },
                "f2": { "mangled_name": "_ZN4cvc53barEv", "file": "src/theory/foo.cpp" },
                "f3": { "mangled_name": "", "file": "src/theory/bar.cpp" }
            }
        }),
    );
    let out = tmp.path().join("allowlist.txt");

    let output = run(&[
        "allowlist",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Generated allowlist with 2 functions across 1 files"));
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "src:src/theory/foo.cpp\nfun:_ZN4cvc53barEv\nfun:_ZN4cvc53fooEv\n\n"
    );
}

#[test]
fn test_allowlist_rejects_missing_function_map() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_json(tmp.path(), "changed.json", &json!({ "other": {} }));
    let out = tmp.path().join("allowlist.txt");

    let output = run(&[
        "allowlist",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

// =========================================================================
// sancov-stats
// =========================================================================

fn coverage_report(tests: &[(&str, usize)]) -> Value {
    let test_coverage: serde_json::Map<String, Value> = tests
        .iter()
        .map(|(name, count)| {
            let pcs: Vec<String> = (0..*count).map(|pc| format!("0x{pc:x}")).collect();
            ((*name).to_string(), json!(pcs))
        })
        .collect();
    json!({
        "stats": { "processed_files": tests.len() },
        "covered_pcs": ["0x1", "0x2", "0x3"],
        "test_coverage": test_coverage,
    })
}

#[test]
fn test_sancov_stats_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let report = write_json(
        tmp.path(),
        "coverage.json",
        &coverage_report(&[("t1", 3), ("t2", 10)]),
    );

    let output = run(&["sancov-stats", report.to_str().unwrap(), "--format", "csv"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(lines[0], "test_id,unique_pcs");
    assert!(lines.contains(&"t1,3".to_string()));
    assert!(lines.contains(&"t2,10".to_string()));
}

#[test]
fn test_sancov_stats_compare_json_keys_by_file_stem() {
    let tmp = tempfile::tempdir().unwrap();
    let baseline = write_json(tmp.path(), "baseline.json", &coverage_report(&[("t1", 1)]));
    let variant = write_json(tmp.path(), "variant1.json", &coverage_report(&[("t1", 2)]));

    let output = run(&[
        "sancov-stats",
        "--format",
        "json",
        "--compare",
        baseline.to_str().unwrap(),
        variant.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(value.get("baseline").is_some());
    assert!(value.get("variant1").is_some());
}

#[test]
fn test_sancov_stats_requires_input() {
    let output = run(&["sancov-stats"]);
    assert_eq!(output.status.code(), Some(1));
}

// =========================================================================
// changed-functions
// =========================================================================

fn write_statistics(mirror: &Path, solver: &str, variant: &str, commit: &str, stats: &Value) {
    let dir = mirror
        .join("evaluation/rq2")
        .join(solver)
        .join("fuzzing-statistics")
        .join(variant);
    std::fs::create_dir_all(&dir).unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(serde_json::to_string(stats).unwrap().as_bytes())
        .unwrap();
    let bytes = encoder.finish().unwrap();
    std::fs::write(dir.join(format!("fuzzing_statistics-{commit}.json.gz")), bytes).unwrap();
}

#[test]
fn test_changed_functions_from_mirror() {
    let tmp = tempfile::tempdir().unwrap();
    write_statistics(
        tmp.path(),
        "cvc5",
        "variant1",
        "abc123",
        &json!({
            "functions": [
                { "function_id": "src/a.cpp:foo" },
                { "name": "no id" },
                { "function_id": "src/b.cpp:bar" }
            ]
        }),
    );

    let output = run(&[
        "changed-functions",
        "cvc5",
        "abc123",
        "--mirror-dir",
        tmp.path().to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        value,
        json!({
            "commit_hash": "abc123",
            "changed_functions": ["src/a.cpp:foo", "src/b.cpp:bar"],
            "total_functions": 2
        })
    );
}

#[test]
fn test_changed_functions_missing_statistics() {
    let tmp = tempfile::tempdir().unwrap();

    let output = run(&[
        "changed-functions",
        "z3",
        "deadbeef",
        "--mirror-dir",
        tmp.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("variant1 statistics not found for commit deadbeef"));
}

#[test]
fn test_changed_functions_requires_bucket_without_mirror() {
    let output = run(&["changed-functions", "cvc5", "abc123"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("AWS_S3_BUCKET"));
}
