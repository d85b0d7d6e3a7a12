// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `record` command.

use super::common::ConfigOpts;
use crate::{
    ExpectedError, Result,
    errors::InputSource,
    output::{OutputContext, OutputWriter},
};
use camino::Utf8PathBuf;
use clap::Args;
use std::io::{self, Read, Write};
use testpulse_analytics::{
    analytics::RecordOutcome, errors::DisplayErrorChain, helpers::DisplayPercent, run::TestRun,
};
use tracing::{debug, info, warn};

/// Options for `testpulse record`.
#[derive(Debug, Args)]
pub(crate) struct RecordOpts {
    /// JSON file with the test run to record, or `-` for standard input
    /// [default: standard input].
    #[arg(value_name = "FILE")]
    file: Option<Utf8PathBuf>,
}

impl RecordOpts {
    pub(crate) fn exec(
        self,
        config_opts: &ConfigOpts,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let input = match self.file {
            Some(path) if path != "-" => InputSource::File(path),
            _ => InputSource::Stdin,
        };
        let run = read_run(&input)?;

        let mut analytics = config_opts.load_analytics()?;
        let recorded = match analytics.record_run(run) {
            Ok(RecordOutcome::Empty) => {
                warn!("test run from {input} has no test results, ignoring");
                false
            }
            Ok(RecordOutcome::Recorded) => {
                if output.verbose
                    && let Some(store) = analytics.store()
                {
                    info!("saved analytics snapshot to {}", store.path());
                }
                true
            }
            Err(error) => {
                warn!(
                    "test run recorded, but analytics could not be saved: {}",
                    DisplayErrorChain::new(error),
                );
                true
            }
        };

        if recorded {
            let metrics = analytics.metrics();
            let mut writer = output_writer.stdout_writer();
            writeln!(
                writer,
                "recorded run {} (pass rate {}, recent {}, {} flaky)",
                metrics.total_runs,
                DisplayPercent(metrics.pass_rate),
                DisplayPercent(metrics.recent_pass_rate),
                metrics.flaky_tests.len(),
            )
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutputError { err })?;
        }

        Ok(0)
    }
}

fn read_run(input: &InputSource) -> Result<TestRun> {
    let contents = match input {
        InputSource::Stdin => {
            let mut contents = String::new();
            io::stdin()
                .read_to_string(&mut contents)
                .map(|_| contents)
        }
        InputSource::File(path) => std::fs::read_to_string(path),
    }
    .map_err(|err| ExpectedError::InputReadError {
        input: input.clone(),
        err,
    })?;

    parse_run(&contents).map_err(|err| ExpectedError::InputParseError {
        input: input.clone(),
        err,
    })
}

/// Parses a test run, deriving the aggregate counts from the results if the
/// runner didn't report any.
fn parse_run(contents: &str) -> Result<TestRun, serde_json::Error> {
    let run: TestRun = serde_json::from_str(contents)?;
    if run.total == 0 && !run.is_empty() {
        debug!("test run has no aggregate counts, deriving them from results");
        let TestRun {
            tests,
            start_time,
            end_time,
            timestamp,
            ..
        } = run;
        return Ok(TestRun {
            start_time,
            end_time,
            timestamp,
            ..TestRun::from_results(tests)
        });
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn counts_are_kept_when_present() {
        let run = parse_run(indoc! {r#"
            {
                "tests": [{"name": "a", "file": "a.rs", "line": 1, "status": "pass"}],
                "total": 3,
                "passed": 2,
                "failed": 1
            }
        "#})
        .unwrap();
        assert_eq!((run.total, run.passed, run.failed), (3, 2, 1));
    }

    #[test]
    fn counts_are_derived_when_missing() {
        let run = parse_run(indoc! {r#"
            {
                "tests": [
                    {"name": "a", "file": "a.rs", "line": 1, "status": "pass"},
                    {"name": "b", "file": "a.rs", "line": 7, "status": "fail", "message": "boom"},
                    {"name": "c", "file": "b.rs", "line": 2, "status": "skip"}
                ],
                "timestamp": "2024-03-01T12:00:00Z"
            }
        "#})
        .unwrap();
        assert_eq!(
            (run.total, run.passed, run.failed, run.skipped),
            (3, 1, 1, 1)
        );
        assert!(run.timestamp.is_some());
    }

    #[test]
    fn invalid_status_is_parse_error() {
        let error = parse_run(r#"{"tests": [{"name": "a", "file": "a.rs", "line": 1, "status": "ok"}]}"#)
            .unwrap_err();
        assert!(error.is_data(), "unexpected error: {error}");
    }
}
