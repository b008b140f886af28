//! Sanitizer-coverage allowlist generation.
//!
//! Builds a Clang `-fsanitize-coverage-allowlist` file from the
//! `function_info_map` emitted by the commit fuzzer preparation step. Each
//! function entry carries a mangled name and the source file defining it:
//!
//! ```text
//! src:src/theory/arith/arith_utilities.cpp
//! fun:_ZN4cvc58internal6theory5arith9mkRationalERKNS0_8RationalE
//! fun:_ZN4cvc58internal6theory5arith9mkBoundedEv
//!
//! src:src/util/integer.cpp
//! fun:_ZN4cvc58internal7IntegerC2Ev
//! ```
//!
//! Source paths are normalized relative to the repository source root so the
//! allowlist matches the paths seen by the compiler in a CI checkout.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Source root that allowlist paths are anchored at.
pub const DEFAULT_SOURCE_ROOT: &str = "src";

/// Errors that can occur while building an allowlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AllowlistError {
    /// The input has no (or an empty) `function_info_map`.
    #[error("no function_info_map found in input JSON")]
    EmptyFunctionMap,

    /// The `function_info_map` is not a JSON object.
    #[error("function_info_map must be a JSON object")]
    InvalidFunctionMap,
}

/// Metadata for one function in the `function_info_map`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FunctionInfo {
    /// Mangled (linkage) name of the function.
    #[serde(default)]
    pub mangled_name: Option<String>,
    /// Path of the defining source file, absolute or relative.
    #[serde(default)]
    pub file: Option<String>,
}

/// A source path after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// The normalized path.
    pub path: String,
    /// False if the path could not be anchored at the source root.
    pub anchored: bool,
}

/// Normalizes `file` to a path starting with `<root>/`.
///
/// Absolute paths are cut at the last `/<root>/` component, or reduced to
/// the file name when there is none. Relative paths containing `<root>/` are
/// cut at its last occurrence. Anything else is kept as-is and reported as
/// unanchored.
#[must_use]
pub fn normalize_source_path(file: &str, root: &str) -> NormalizedPath {
    let prefix = format!("{root}/");
    let marker = format!("/{prefix}");

    let mut path = file.to_string();
    if path.starts_with('/') {
        path = match path.rfind(&marker) {
            Some(idx) => format!("{prefix}{}", &path[idx + marker.len()..]),
            None => Path::new(&path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
    }

    if path.starts_with(&prefix) {
        return NormalizedPath {
            path,
            anchored: true,
        };
    }

    match path.rfind(&prefix) {
        Some(idx) => NormalizedPath {
            path: format!("{prefix}{}", &path[idx + prefix.len()..]),
            anchored: true,
        },
        None => NormalizedPath {
            path,
            anchored: false,
        },
    }
}

/// Functions grouped by normalized source file, both sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    files: BTreeMap<String, BTreeSet<String>>,
}

impl Allowlist {
    /// Builds an allowlist from a prepared-commit JSON document.
    ///
    /// Functions without a mangled name are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`AllowlistError::EmptyFunctionMap`] if the document has no
    /// non-empty `function_info_map`, and
    /// [`AllowlistError::InvalidFunctionMap`] if it is not an object.
    pub fn from_document(doc: &Value, root: &str) -> Result<Self, AllowlistError> {
        let map = match doc.get("function_info_map") {
            None | Some(Value::Null) => return Err(AllowlistError::EmptyFunctionMap),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(AllowlistError::InvalidFunctionMap),
        };
        if map.is_empty() {
            return Err(AllowlistError::EmptyFunctionMap);
        }

        let mut allowlist = Self::default();
        for (key, raw) in map {
            let info = match FunctionInfo::deserialize(raw) {
                Ok(info) => info,
                Err(e) => {
                    warn!(function = %key, error = %e, "malformed function info, skipping");
                    continue;
                },
            };
            allowlist.insert(key, &info, root);
        }
        Ok(allowlist)
    }

    /// Adds one function, normalizing its source path against `root`.
    pub fn insert(&mut self, key: &str, info: &FunctionInfo, root: &str) {
        let Some(mangled_name) = info.mangled_name.as_deref().filter(|name| !name.is_empty())
        else {
            warn!(function = %key, "no mangled name, skipping");
            return;
        };

        let normalized = normalize_source_path(info.file.as_deref().unwrap_or_default(), root);
        if !normalized.anchored {
            warn!(
                path = %normalized.path,
                "file path doesn't start with {root}/, using as-is"
            );
        }

        let functions = self.files.entry(normalized.path).or_default();
        let trimmed = mangled_name.trim();
        if !trimmed.is_empty() {
            functions.insert(trimmed.to_string());
        }
    }

    /// Number of distinct source files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of functions across all files.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.files.values().map(BTreeSet::len).sum()
    }

    /// Renders the allowlist in Clang's `src:`/`fun:` format.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (file, functions) in &self.files {
            let _ = writeln!(out, "src:{file}");
            for function in functions {
                let _ = writeln!(out, "fun:{function}");
            }
            out.push('\n');
        }
        out
    }
}
