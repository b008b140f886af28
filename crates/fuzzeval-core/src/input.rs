//! JSON input loading.
//!
//! Every utility starts by reading one or more JSON documents from disk.
//! Missing files and unparseable content are distinguished so the CLI can
//! report "not found" separately from "malformed".

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur while loading an input artifact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InputError {
    /// The input file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The input file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The input file is not valid JSON or does not match the expected shape.
    #[error("invalid JSON in {}: {source}", path.display())]
    Malformed {
        /// The path being parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl InputError {
    /// Returns true if the error means the input does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Reads a file and deserializes it as JSON.
///
/// # Errors
///
/// Returns [`InputError::NotFound`] if the file does not exist,
/// [`InputError::Io`] for other read failures, and [`InputError::Malformed`]
/// if the content does not deserialize into `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            InputError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            InputError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|source| InputError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
