// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use super::{common::CommonOpts, record::RecordOpts, show::ShowOpts};
use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputWriter},
};
use clap::Subcommand;
use std::io::Write;
use testpulse_analytics::{analytics::TestAnalytics, store::HistoryStore};

/// Record test runs, track flaky tests and render text dashboards.
///
/// Test runs are read as JSON documents, and accumulated in a snapshot in the
/// state directory.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct TestpulseApp {
    #[clap(flatten)]
    common: CommonOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TestpulseApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.common.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let config_opts = &self.common.config_opts;
        match self.command {
            Command::Record(opts) => opts.exec(config_opts, output, output_writer),
            Command::Show(opts) => opts.exec(config_opts, output, output_writer),
            Command::Clear => {
                let config = config_opts.load_config()?;
                let store = HistoryStore::new(&config_opts.state_dir()?);
                let path = store.path().to_owned();
                TestAnalytics::new(config, store).clear_history()?;

                write_line(output_writer, format_args!("cleared analytics history at {path}"))?;
                Ok(0)
            }
            Command::StateDir => {
                let state_dir = config_opts.state_dir()?;
                write_line(output_writer, format_args!("{state_dir}"))?;
                Ok(0)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a test run.
    ///
    /// The run is read as JSON from FILE or standard input. A run without any
    /// test results is ignored.
    Record(RecordOpts),

    /// Show a dashboard view.
    Show(ShowOpts),

    /// Delete all recorded analytics.
    Clear,

    /// Print the directory the analytics snapshot is stored in.
    StateDir,
}

fn write_line(output_writer: &mut OutputWriter, args: std::fmt::Arguments<'_>) -> Result<()> {
    let mut writer = output_writer.stdout_writer();
    writeln!(writer, "{args}")
        .and_then(|()| writer.flush())
        .map_err(|err| ExpectedError::WriteOutputError { err })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    #[test]
    fn verify_app() {
        TestpulseApp::command().debug_assert();
    }

    fn exec(args: &[&str]) -> (Result<i32>, String) {
        let app = TestpulseApp::try_parse_from(args).unwrap();
        let output = app.init_output();
        let mut output_writer = OutputWriter::Test { stdout: Vec::new() };
        let result = app.exec(output, &mut output_writer);
        let OutputWriter::Test { stdout } = output_writer else {
            unreachable!("test writer was created above")
        };
        (result, String::from_utf8(stdout).unwrap())
    }

    #[test]
    fn record_show_clear() {
        let temp_dir = Utf8TempDir::new().unwrap();
        let state_dir = temp_dir.path().join("state");
        let common = [
            "testpulse",
            "--color",
            "never",
            "--config-file",
            "none",
            "--state-dir",
            state_dir.as_str(),
        ];

        let statuses = ["pass", "fail", "pass"];
        for (index, status) in statuses.iter().enumerate() {
            let run_file = temp_dir.path().join(format!("run-{index}.json"));
            std::fs::write(
                &run_file,
                format!(
                    r#"{{"tests": [
                        {{"name": "login", "file": "tests/auth.rs", "line": 12, "status": "{status}",
                          "message": "expected 200, got 503"}},
                        {{"name": "logout", "file": "tests/auth.rs", "line": 30, "status": "pass"}}
                    ]}}"#
                ),
            )
            .unwrap();

            let mut args = common.to_vec();
            args.extend(["record", run_file.as_str()]);
            let (result, stdout) = exec(&args);
            assert_eq!(result.unwrap(), 0);
            assert!(
                stdout.starts_with(&format!("recorded run {}", index + 1)),
                "unexpected output: {stdout}"
            );
        }

        let mut args = common.to_vec();
        args.extend(["show", "flaky"]);
        let (result, stdout) = exec(&args);
        assert_eq!(result.unwrap(), 0);
        assert!(stdout.starts_with("Flaky tests (1)\n"), "{stdout}");
        assert!(stdout.contains("  location: tests/auth.rs:12\n"));
        // The first pass predates the flip, so it wasn't persisted in detail.
        assert!(stdout.contains("  recent: F P\n"), "{stdout}");

        let mut args = common.to_vec();
        args.extend(["show", "patterns", "--pattern", "expected 404, got 500"]);
        let (result, stdout) = exec(&args);
        assert_eq!(result.unwrap(), 0);
        assert!(stdout.contains("expected N, got N (1 occurrence)\n"), "{stdout}");

        let mut args = common.to_vec();
        args.extend(["show", "files"]);
        let (_, stdout) = exec(&args);
        assert!(stdout.contains("tests/auth.rs  6 tests, 5 passed, 1 failed"), "{stdout}");

        let mut args = common.to_vec();
        args.push("clear");
        let (result, stdout) = exec(&args);
        assert_eq!(result.unwrap(), 0);
        assert!(stdout.starts_with("cleared analytics history"));

        let mut args = common.to_vec();
        args.extend(["show", "dashboard"]);
        let (_, stdout) = exec(&args);
        assert_eq!(stdout, "no test runs recorded\n");
    }

    #[test]
    fn state_dir_is_printed() {
        let (result, stdout) = exec(&["testpulse", "--state-dir", "/tmp/pulse", "state-dir"]);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(stdout, "/tmp/pulse\n");
    }

    #[test]
    fn malformed_input_is_expected_error() {
        let temp_dir = Utf8TempDir::new().unwrap();
        let run_file = temp_dir.path().join("run.json");
        std::fs::write(&run_file, "not json").unwrap();

        let (result, stdout) = exec(&[
            "testpulse",
            "--config-file",
            "none",
            "--state-dir",
            temp_dir.path().as_str(),
            "record",
            run_file.as_str(),
        ]);
        let error = result.unwrap_err();
        assert!(
            matches!(error, ExpectedError::InputParseError { .. }),
            "unexpected error: {error:?}"
        );
        assert_eq!(error.process_exit_code(), crate::TestpulseExitCode::INVALID_INPUT);
        assert!(stdout.is_empty());
    }
}
