// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test runs and the per-test results they carry.
//!
//! These are the input types: an external test runner produces a [`TestRun`]
//! and hands it to [`TestAnalytics::record_run`](crate::analytics::TestAnalytics::record_run).
//! Once recorded, a run is never mutated.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// The outcome of a single test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestStatus {
    /// The test passed.
    Pass,
    /// The test failed.
    Fail,
    /// The test was skipped.
    Skip,
}

impl TestStatus {
    /// Returns the string representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity of a test: its file and line, formatted as `file:line`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    /// Creates a new test ID from a file path and line number.
    pub fn new(file: &Utf8Path, line: u32) -> Self {
        Self(format!("{file}:{line}"))
    }

    /// Returns the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The result of a single completed test.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestResult {
    /// The test name.
    pub name: String,

    /// The file the test is defined in.
    pub file: Utf8PathBuf,

    /// The line the test is defined on.
    pub line: u32,

    /// The outcome.
    pub status: TestStatus,

    /// The failure message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestResult {
    /// Creates a new result without a message.
    pub fn new(
        name: impl Into<String>,
        file: impl Into<Utf8PathBuf>,
        line: u32,
        status: TestStatus,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line,
            status,
            message: None,
        }
    }

    /// Sets the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the identity of this test.
    pub fn id(&self) -> TestId {
        TestId::new(&self.file, self.line)
    }
}

/// One execution of a test suite (or a subset of it).
///
/// The aggregate counts are carried separately from `tests` because runners
/// report them directly; use [`TestRun::from_results`] to derive them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestRun {
    /// Individual test results.
    ///
    /// Empty for run summaries restored from a snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TestResult>,

    /// Total number of tests in the run.
    #[serde(default)]
    pub total: usize,

    /// Number of passing tests.
    #[serde(default)]
    pub passed: usize,

    /// Number of failing tests.
    #[serde(default)]
    pub failed: usize,

    /// Number of skipped tests.
    #[serde(default)]
    pub skipped: usize,

    /// When the run started.
    #[serde(default, alias = "start_time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// When the run finished.
    #[serde(default, alias = "end_time", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// When the run was recorded. Filled in at record time if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TestRun {
    /// Creates a run from its results, deriving the aggregate counts.
    pub fn from_results(tests: Vec<TestResult>) -> Self {
        let mut run = Self {
            total: tests.len(),
            ..Default::default()
        };
        for test in &tests {
            match test.status {
                TestStatus::Pass => run.passed += 1,
                TestStatus::Fail => run.failed += 1,
                TestStatus::Skip => run.skipped += 1,
            }
        }
        run.tests = tests;
        run
    }

    /// Sets the start and end times.
    pub fn with_times(mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// Sets the record timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Returns a copy of this run without its individual results.
    ///
    /// Summaries carry everything metrics are computed from.
    pub fn summary(&self) -> Self {
        Self {
            tests: Vec::new(),
            ..self.clone()
        }
    }

    /// Returns true if the run carries no test results.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Returns the fraction of tests that passed, in `[0, 1]`.
    ///
    /// A run with a zero total has a pass ratio of 0.
    pub fn pass_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }

    /// Returns the wall-clock duration of the run, if both times are known.
    ///
    /// An end time before the start time produces a zero duration.
    pub fn duration(&self) -> Option<Duration> {
        let (start, end) = (self.start_time?, self.end_time?);
        Some((end - start).to_std().unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn from_results_counts_statuses() {
        let run = TestRun::from_results(vec![
            TestResult::new("a", "src/a.rs", 1, TestStatus::Pass),
            TestResult::new("b", "src/a.rs", 5, TestStatus::Fail),
            TestResult::new("c", "src/b.rs", 3, TestStatus::Skip),
            TestResult::new("d", "src/b.rs", 9, TestStatus::Pass),
        ]);
        assert_eq!(
            (run.total, run.passed, run.failed, run.skipped),
            (4, 2, 1, 1)
        );
        assert_eq!(run.pass_ratio(), 0.5);
    }

    #[test]
    fn zero_total_has_zero_ratio() {
        let run = TestRun::default();
        assert!(run.is_empty());
        assert_eq!(run.pass_ratio(), 0.0);
    }

    #[test]
    fn duration_requires_both_times() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 42).unwrap();

        let mut run = TestRun::default();
        assert_eq!(run.duration(), None);
        run.start_time = Some(start);
        assert_eq!(run.duration(), None);

        let run = run.with_times(start, end);
        assert_eq!(run.duration(), Some(Duration::from_secs(42)));

        let reversed = TestRun::default().with_times(end, start);
        assert_eq!(reversed.duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_id_format() {
        let result = TestResult::new("parses", "tests/parse.rs", 17, TestStatus::Pass);
        assert_eq!(result.id().as_str(), "tests/parse.rs:17");
    }

    #[test]
    fn deserialize_runner_output() {
        let run: TestRun = serde_json::from_str(
            r#"{
                "tests": [
                    {"name": "adds", "file": "math.rs", "line": 3, "status": "pass"},
                    {"name": "divides", "file": "math.rs", "line": 9, "status": "fail",
                     "message": "expected 2, got 3"}
                ],
                "total": 2,
                "passed": 1,
                "failed": 1,
                "start_time": "2024-03-01T12:00:00Z",
                "end-time": "2024-03-01T12:00:05+00:00"
            }"#,
        )
        .unwrap();

        assert_eq!(run.tests.len(), 2);
        assert_eq!(run.tests[1].message.as_deref(), Some("expected 2, got 3"));
        assert_eq!(run.skipped, 0);
        assert_eq!(run.duration(), Some(Duration::from_secs(5)));
        assert_eq!(run.timestamp, None);
    }

    #[test]
    fn summary_drops_results() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let run = TestRun::from_results(vec![
            TestResult::new("a", "src/a.rs", 1, TestStatus::Pass),
            TestResult::new("b", "src/a.rs", 5, TestStatus::Fail),
        ])
        .with_times(start, start)
        .with_timestamp(start);

        let summary = run.summary();
        assert!(summary.is_empty());
        assert_eq!((summary.total, summary.passed, summary.failed), (2, 1, 1));
        assert_eq!(summary.timestamp, Some(start));
        assert_eq!(summary.pass_ratio(), run.pass_ratio());

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("tests").is_none());
    }

    #[test]
    fn missing_test_list_is_empty() {
        let run: TestRun = serde_json::from_str(r#"{"total": 3}"#).unwrap();
        assert!(run.is_empty());
    }
}
