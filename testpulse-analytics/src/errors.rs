// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testpulse.

use camino::{FromPathBufError, Utf8PathBuf};
use std::{error::Error, fmt, path::PathBuf};
use thiserror::Error;

/// Displays an error along with its chain of causes.
///
/// Used for logging an error on a single `warn!` without losing the
/// underlying I/O or parse error.
#[derive(Clone, Debug)]
pub struct DisplayErrorChain<E> {
    error: E,
    initial_indent: &'static str,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new display wrapper for the error chain.
    pub fn new(error: E) -> Self {
        Self {
            error,
            initial_indent: "",
        }
    }

    /// Creates a new display wrapper whose lines start with the given indent.
    pub fn new_with_initial_indent(initial_indent: &'static str, error: E) -> Self {
        Self {
            error,
            initial_indent,
        }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.initial_indent, self.error)?;

        let mut current = self.error.source();
        if current.is_some() {
            write!(f, "\n{}  caused by:", self.initial_indent)?;
        }
        while let Some(cause) = current {
            write!(f, "\n{}  - {}", self.initial_indent, cause)?;
            current = cause.source();
        }

        Ok(())
    }
}

/// An error that occurs while saving an analytics snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaveError {
    /// Error creating the state directory.
    #[error("failed to create directory `{path}`")]
    CreateDir {
        /// The directory that failed to be created.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// Error serializing the snapshot.
    #[error("failed to serialize analytics snapshot")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        error: serde_json::Error,
    },

    /// Error writing the snapshot to disk.
    #[error("failed to write analytics snapshot to `{path}`")]
    Write {
        /// The path that failed to be written.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurs while loading an analytics snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Error reading the snapshot file.
    #[error("failed to read analytics snapshot at `{path}`")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// Error deserializing the snapshot.
    #[error("failed to deserialize analytics snapshot at `{path}`")]
    Deserialize {
        /// The path that failed to be deserialized.
        path: Utf8PathBuf,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },

    /// The snapshot was written with a different schema version.
    #[error(
        "analytics snapshot at `{path}` has version {actual}, \
         but this version of testpulse reads version {expected}"
    )]
    VersionMismatch {
        /// The path with the version mismatch.
        path: Utf8PathBuf,

        /// The version this build reads.
        expected: u32,

        /// The version found in the file.
        actual: u32,
    },
}

/// An error that occurs while clearing an analytics snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClearError {
    /// Error removing the snapshot file.
    #[error("failed to remove analytics snapshot at `{path}`")]
    Remove {
        /// The path that failed to be removed.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurs while determining the state directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateDirError {
    /// The platform base directories could not be determined.
    #[error("could not determine platform base directories")]
    BaseDirStrategy(#[source] etcetera::HomeDirError),

    /// The platform state directory is not valid UTF-8.
    #[error("platform state directory is not valid UTF-8: {path:?}")]
    StateDirNotUtf8 {
        /// The path that was not UTF-8.
        path: PathBuf,
    },
}

/// An error that occurs while loading user configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserConfigError {
    /// The user config file specified explicitly was not found.
    #[error("user config file not found at `{path}`")]
    FileNotFound {
        /// The path that was specified.
        path: Utf8PathBuf,
    },

    /// Error reading the user config file.
    #[error("failed to read user config at `{path}`")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// Error parsing the user config file.
    #[error("failed to parse user config at `{path}`")]
    Parse {
        /// The path that failed to be parsed.
        path: Utf8PathBuf,

        /// The underlying TOML error.
        #[source]
        error: toml::de::Error,
    },

    /// A setting has an invalid value.
    #[error("in user config at `{path}`, `{key}` must be at least 1")]
    ZeroValue {
        /// The config file containing the setting.
        path: Utf8PathBuf,

        /// The kebab-case key, including its section.
        key: &'static str,
    },

    /// The platform config directory is not valid UTF-8.
    #[error("user config directory is not valid UTF-8")]
    NonUtf8Path {
        /// The underlying error.
        #[source]
        error: FromPathBufError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error_chain_lists_causes() {
        let error = SaveError::Write {
            path: "state/test-analytics.json".into(),
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        };

        assert_eq!(
            DisplayErrorChain::new(&error).to_string(),
            "failed to write analytics snapshot to `state/test-analytics.json`\n  \
             caused by:\n  \
             - permission denied",
        );
    }

    #[test]
    fn display_error_chain_with_indent() {
        let error = ClearError::Remove {
            path: "a".into(),
            error: std::io::Error::other("b"),
        };
        let chain = DisplayErrorChain::new_with_initial_indent("  ", &error).to_string();
        assert!(chain.starts_with("  failed to remove analytics snapshot at `a`"));
        assert!(chain.ends_with("  - b"));
    }
}
