//! Seeded test-corpus partitioning.
//!
//! The corpus is shuffled with a seeded PRNG and cut into consecutive,
//! non-overlapping windows of `ceil(T / J)` tests. When the corpus is smaller
//! than the requested shard count, fewer shards are produced rather than
//! emitting empty ones.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use super::{Job, JobMatrix, TestId};

/// Seed used for baseline runs unless overridden.
pub const DEFAULT_SEED: u64 = 42;

/// Number of shards a baseline run is split into unless overridden.
pub const DEFAULT_SHARD_COUNT: usize = 4;

/// Errors that can occur while partitioning a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PartitionError {
    /// The corpus has no tests.
    #[error("cannot partition an empty test corpus")]
    EmptyCorpus,

    /// The requested shard count is zero.
    #[error("target shard count must be at least 1, got {count}")]
    InvalidShardCount {
        /// The rejected shard count.
        count: usize,
    },
}

/// Shuffles `tests` with `seed` and splits them into at most
/// `target_shard_count` jobs.
///
/// Job ids are the 0-based window index. Each job's `tests` keeps the
/// shuffled order.
///
/// # Errors
///
/// Returns [`PartitionError::EmptyCorpus`] if `tests` is empty and
/// [`PartitionError::InvalidShardCount`] if `target_shard_count` is zero.
pub fn partition(
    tests: &[TestId],
    target_shard_count: usize,
    seed: u64,
) -> Result<JobMatrix, PartitionError> {
    if tests.is_empty() {
        return Err(PartitionError::EmptyCorpus);
    }
    if target_shard_count == 0 {
        return Err(PartitionError::InvalidShardCount {
            count: target_shard_count,
        });
    }

    let mut shuffled = tests.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let shard_size = shuffled.len().div_ceil(target_shard_count);
    let include: Vec<Job> = shuffled
        .chunks(shard_size)
        .enumerate()
        .map(|(job_id, window)| Job {
            job_id,
            tests: window.to_vec(),
        })
        .collect();

    debug!(
        tests = shuffled.len(),
        shard_size,
        jobs = include.len(),
        seed,
        "partitioned corpus"
    );

    Ok(JobMatrix { include })
}
