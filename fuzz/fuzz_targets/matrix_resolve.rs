//! Fuzz harness for `MatrixResolver`.
//!
//! Matrix files come from CI artifacts and may be truncated or hand-edited.
//! Arbitrary bytes are parsed as JSON and every resolution path is run
//! against the result; none of them may panic.

#![no_main]
use fuzzeval_core::matrix::MatrixResolver;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let Ok(resolver) = MatrixResolver::new(&doc) else {
        return;
    };

    // Reuse the first entry's commit when present so prefix matching is hit.
    let commit = doc
        .get("include")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("commit"))
        .and_then(Value::as_str)
        .unwrap_or("abc1234");

    let short: String = commit.chars().take(7).collect();

    for job_id in ["0", " 1 ", "-3", "x", ""] {
        let _ = resolver.resolve(commit, job_id);
        let _ = resolver.resolve(&short, job_id);
        let _ = resolver.resolve_job(job_id);
    }
    let _ = resolver.diagnose(commit);
});
