//! Object store access for evaluation artifacts.
//!
//! Statistics blobs are fetched through the [`ObjectStore`] trait so the
//! transport stays at the edge of the system:
//!
//! - [`AwsCliStore`] downloads from S3 with the `aws` CLI
//! - [`DirectoryStore`] serves keys from a local mirror of the bucket
//!
//! A missing object ([`FetchError::NotFound`]) is an expected state (the
//! statistics have not been produced yet) and is kept distinct from
//! transport and permission failures.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use xshell::{Shell, cmd};

use crate::config::StoreConfig;

/// Errors that can occur while fetching an object.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The object does not exist.
    #[error("object not found: {location}")]
    NotFound {
        /// Store location of the object.
        location: String,
    },

    /// Any other failure (network, permissions, local IO).
    #[error("failed to fetch {location}: {reason}")]
    Transport {
        /// Store location of the object.
        location: String,
        /// Description of the failure.
        reason: String,
    },
}

impl FetchError {
    /// Returns true if the object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A read-only store of objects addressed by key.
pub trait ObjectStore {
    /// Human-readable location of `key`, used in logs and errors.
    fn location(&self, key: &str) -> String;

    /// Downloads `key` to the local file `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] if the object does not exist and
    /// [`FetchError::Transport`] for every other failure.
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Returns true if an `aws` CLI error message reports a missing object.
#[must_use]
pub fn is_not_found_message(stderr: &str) -> bool {
    stderr.contains("NoSuchKey") || stderr.contains("(404)") || stderr.contains("Not Found")
}

/// S3 access through the `aws` command-line client.
#[derive(Debug, Clone)]
pub struct AwsCliStore {
    config: StoreConfig,
}

impl AwsCliStore {
    /// Creates a store for the configured bucket.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }
}

impl ObjectStore for AwsCliStore {
    fn location(&self, key: &str) -> String {
        format!("s3://{}/{key}", self.config.bucket)
    }

    fn fetch(&self, key: &str, dest: &Path) -> Result<(), FetchError> {
        let location = self.location(key);
        let transport = |reason: String| FetchError::Transport {
            location: location.clone(),
            reason,
        };

        let sh = Shell::new().map_err(|e| transport(e.to_string()))?;
        let bucket = &self.config.bucket;
        let region = &self.config.region;

        debug!(%location, dest = %dest.display(), "downloading object");
        let output = cmd!(
            sh,
            "aws s3api get-object --bucket {bucket} --key {key} --region {region} {dest}"
        )
        .quiet()
        .ignore_status()
        .output()
        .map_err(|e| transport(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_found_message(&stderr) {
            Err(FetchError::NotFound {
                location: self.location(key),
            })
        } else {
            Err(transport(stderr.trim().to_string()))
        }
    }
}

/// Objects served from a local directory laid out like the bucket.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for DirectoryStore {
    fn location(&self, key: &str) -> String {
        self.root.join(key).display().to_string()
    }

    fn fetch(&self, key: &str, dest: &Path) -> Result<(), FetchError> {
        let source = self.root.join(key);
        match std::fs::copy(&source, dest) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound {
                location: self.location(key),
            }),
            Err(e) => Err(FetchError::Transport {
                location: self.location(key),
                reason: e.to_string(),
            }),
        }
    }
}
