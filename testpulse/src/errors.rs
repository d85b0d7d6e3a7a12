// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use testpulse_analytics::errors::{ClearError, StateDirError, UserConfigError};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Documented exit codes for `testpulse` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TestpulseExitCode {}

impl TestpulseExitCode {
    /// No errors occurred and testpulse exited normally.
    pub const OK: i32 = 0;

    /// The test run given to `testpulse record` could not be read or parsed.
    pub const INVALID_INPUT: i32 = 94;

    /// A user issue happened while setting up a testpulse invocation: for
    /// example, an invalid config file.
    pub const SETUP_ERROR: i32 = 96;

    /// The analytics snapshot could not be removed.
    pub const STORE_ERROR: i32 = 98;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

/// Where a test run is read from.
#[derive(Clone, Debug)]
pub enum InputSource {
    /// Standard input.
    Stdin,

    /// A file on disk.
    File(Utf8PathBuf),
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => f.write_str("standard input"),
            Self::File(path) => write!(f, "`{path}`"),
        }
    }
}

// The #[error()] strings are placeholder messages: errors are meant to be
// printed with display_to_stderr, which colorizes them.

/// An expected error: one that is reported to the user with a stable exit
/// code rather than as a crash.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("user config error")]
    UserConfigError {
        #[from]
        err: UserConfigError,
    },
    #[error("state directory error")]
    StateDirError {
        #[from]
        err: StateDirError,
    },
    #[error("input read error")]
    InputReadError {
        input: InputSource,
        #[source]
        err: std::io::Error,
    },
    #[error("input parse error")]
    InputParseError {
        input: InputSource,
        #[source]
        err: serde_json::Error,
    },
    #[error("clear error")]
    ClearError {
        #[from]
        err: ClearError,
    },
    #[error("write output error")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::UserConfigError { .. } | Self::StateDirError { .. } => {
                TestpulseExitCode::SETUP_ERROR
            }
            Self::InputReadError { .. } | Self::InputParseError { .. } => {
                TestpulseExitCode::INVALID_INPUT
            }
            Self::ClearError { .. } => TestpulseExitCode::STORE_ERROR,
            Self::WriteOutputError { .. } => TestpulseExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::UserConfigError { err } => {
                tracing::error!("failed to load user config");
                Some(err as &dyn Error)
            }
            Self::StateDirError { err } => {
                tracing::error!("failed to determine the state directory");
                Some(err as &dyn Error)
            }
            Self::InputReadError { input, err } => {
                tracing::error!(
                    "failed to read test run from {}",
                    input.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::InputParseError { input, err } => {
                tracing::error!(
                    "failed to parse test run from {}",
                    input.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::ClearError { err } => {
                tracing::error!("failed to clear analytics history");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn exit_codes() {
        let read = ExpectedError::InputReadError {
            input: InputSource::Stdin,
            err: io::Error::other("closed"),
        };
        assert_eq!(read.process_exit_code(), TestpulseExitCode::INVALID_INPUT);

        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let parse = ExpectedError::InputParseError {
            input: InputSource::File("run.json".into()),
            err: parse_err,
        };
        assert_eq!(parse.process_exit_code(), TestpulseExitCode::INVALID_INPUT);

        let write = ExpectedError::WriteOutputError {
            err: io::Error::other("broken pipe"),
        };
        assert_eq!(
            write.process_exit_code(),
            TestpulseExitCode::WRITE_OUTPUT_ERROR
        );
    }

    #[test]
    fn causes_are_logged_without_heading() {
        let error = ExpectedError::ClearError {
            err: ClearError::Remove {
                path: "state/test-analytics.json".into(),
                error: io::Error::other("read-only file system"),
            },
        };
        let logged = crate::output::capture_logs(|| {
            error.display_to_stderr(&StderrStyles::default());
        });
        assert_eq!(
            logged,
            "error: failed to clear analytics history\n\
             \n\
             Caused by:\n  \
             failed to remove analytics snapshot at `state/test-analytics.json`\n\
             \n\
             Caused by:\n  \
             read-only file system\n"
        );
    }

    #[test]
    fn input_source_display() {
        assert_eq!(InputSource::Stdin.to_string(), "standard input");
        assert_eq!(
            InputSource::File("runs/latest.json".into()).to_string(),
            "`runs/latest.json`"
        );
    }
}
