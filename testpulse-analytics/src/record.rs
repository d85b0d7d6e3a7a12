// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling per-test and per-file statistics.

use crate::run::{TestId, TestResult, TestStatus};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// One observation of a test, kept in [`TestRecord::history`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryEntry {
    /// The timestamp of the run the observation came from.
    pub timestamp: DateTime<Utc>,

    /// The observed status.
    pub status: TestStatus,

    /// The failure message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Accumulated statistics for a single test, keyed by [`TestId`].
///
/// Invariant: `passes + failures <= runs`. Skips count towards `runs` only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestRecord {
    /// The test name, as of the latest observation.
    pub name: String,

    /// The file the test is defined in.
    pub file: Utf8PathBuf,

    /// The line the test is defined on.
    pub line: u32,

    /// Number of times this test has been observed.
    pub runs: usize,

    /// Number of passing observations.
    pub passes: usize,

    /// Number of failing observations.
    pub failures: usize,

    /// The most recent observations, oldest first.
    #[serde(default)]
    pub history: VecDeque<HistoryEntry>,

    /// The status of the latest observation.
    #[serde(default)]
    pub last_status: Option<TestStatus>,

    /// Whether two consecutive observations ever disagreed.
    ///
    /// Once set, this is never cleared.
    #[serde(default)]
    pub flaky: bool,

    /// Failure pattern to number of failures that produced it.
    #[serde(default)]
    pub patterns: BTreeMap<String, usize>,
}

/// What changed when a test was observed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Observation {
    /// True if this observation flagged the test as flaky for the first time.
    pub became_flaky: bool,
}

impl TestRecord {
    /// Creates an empty record for the test that produced `result`.
    pub fn new(result: &TestResult) -> Self {
        Self {
            name: result.name.clone(),
            file: result.file.clone(),
            line: result.line,
            runs: 0,
            passes: 0,
            failures: 0,
            history: VecDeque::new(),
            last_status: None,
            flaky: false,
            patterns: BTreeMap::new(),
        }
    }

    /// Returns the identity of this test.
    pub fn id(&self) -> TestId {
        TestId::new(&self.file, self.line)
    }

    /// Folds one result into the record.
    ///
    /// `pattern` is the extracted failure pattern, and must be present for
    /// failures. At most `max_history` entries are kept.
    pub fn observe(
        &mut self,
        result: &TestResult,
        timestamp: DateTime<Utc>,
        pattern: Option<&str>,
        max_history: usize,
    ) -> Observation {
        self.name.clone_from(&result.name);
        self.runs += 1;
        match result.status {
            TestStatus::Pass => self.passes += 1,
            TestStatus::Fail => self.failures += 1,
            TestStatus::Skip => {}
        }
        if let Some(pattern) = pattern {
            *self.patterns.entry(pattern.to_owned()).or_default() += 1;
        }

        let mut became_flaky = false;
        if let Some(last_status) = self.last_status
            && last_status != result.status
            && !self.flaky
        {
            self.flaky = true;
            became_flaky = true;
        }

        self.history.push_back(HistoryEntry {
            timestamp,
            status: result.status,
            message: result.message.clone(),
        });
        while self.history.len() > max_history {
            self.history.pop_front();
        }
        self.last_status = Some(result.status);

        Observation { became_flaky }
    }

    /// Returns the fraction of observations that failed, in `[0, 1]`.
    pub fn failure_ratio(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.failures as f64 / self.runs as f64
        }
    }

    /// Returns the statuses of the most recent `count` observations, oldest
    /// first.
    pub fn recent_statuses(&self, count: usize) -> impl Iterator<Item = TestStatus> + '_ {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).map(|entry| entry.status)
    }
}

/// The failure patterns produced by a single test, across every recorded run.
///
/// Unlike [`TestRecord::patterns`], this is kept for every failing test
/// whether or not it is flaky.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestFailures {
    /// The test name, as of the latest failure.
    pub name: String,

    /// Failure pattern to number of failures that produced it.
    pub patterns: BTreeMap<String, usize>,
}

impl TestFailures {
    /// Creates an empty tally for the test that produced `result`.
    pub fn new(result: &TestResult) -> Self {
        Self {
            name: result.name.clone(),
            patterns: BTreeMap::new(),
        }
    }

    /// Counts one failure of `result` with the given pattern.
    pub fn observe(&mut self, result: &TestResult, pattern: &str) {
        self.name.clone_from(&result.name);
        *self.patterns.entry(pattern.to_owned()).or_default() += 1;
    }
}

/// Rolling tally for all tests in a single file.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileStats {
    /// Number of test results observed in this file.
    pub tests: usize,

    /// Number of passing results.
    pub passes: usize,

    /// Number of failing results.
    pub failures: usize,

    /// Timestamp of the latest run that included this file.
    pub last_run: Option<DateTime<Utc>>,
}

impl FileStats {
    /// Folds one result status into the tally.
    pub fn observe(&mut self, status: TestStatus, timestamp: DateTime<Utc>) {
        self.tests += 1;
        match status {
            TestStatus::Pass => self.passes += 1,
            TestStatus::Fail => self.failures += 1,
            TestStatus::Skip => {}
        }
        self.last_run = Some(timestamp);
    }
}
