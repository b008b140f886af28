//! Object store configuration.
//!
//! The store location comes from the environment. It is read once at the
//! CLI boundary into a [`StoreConfig`] and passed explicitly to whatever
//! needs it; nothing below the boundary reads environment variables.

use thiserror::Error;

/// Environment variable naming the statistics bucket.
pub const BUCKET_ENV: &str = "AWS_S3_BUCKET";

/// Environment variable naming the bucket region.
pub const REGION_ENV: &str = "AWS_REGION";

/// Region used when [`REGION_ENV`] is unset.
pub const DEFAULT_REGION: &str = "eu-north-1";

/// Errors that can occur while building configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("{name} environment variable not set")]
    MissingVariable {
        /// Name of the variable.
        name: &'static str,
    },
}

/// Location of the remote object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Bucket holding the evaluation artifacts.
    pub bucket: String,
    /// Region of the bucket.
    pub region: String,
}

impl StoreConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] if `AWS_S3_BUCKET` is unset
    /// or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] if the bucket is unset or
    /// empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup(BUCKET_ENV)
            .filter(|bucket| !bucket.is_empty())
            .ok_or(ConfigError::MissingVariable { name: BUCKET_ENV })?;
        let region = lookup(REGION_ENV)
            .filter(|region| !region.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self { bucket, region })
    }
}
