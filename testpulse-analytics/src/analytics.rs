// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The analytics engine: run history, per-test records and metrics.

use crate::{
    errors::{ClearError, LoadError, SaveError},
    metrics::Metrics,
    pattern::extract_pattern,
    record::{FileStats, TestFailures, TestRecord},
    run::{TestId, TestResult, TestRun, TestStatus},
    store::{AnalyticsSnapshot, HistoryStore},
    user_config::AnalyticsConfig,
};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// The outcome of [`TestAnalytics::record_run`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordOutcome {
    /// The run carried no test results and was ignored.
    Empty,

    /// The run was recorded (and saved, if the analytics are backed by a
    /// store).
    Recorded,
}

/// The outcome of [`TestAnalytics::load_history`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    /// There was nothing to load; state is unchanged.
    NotFound,

    /// A snapshot was loaded.
    Loaded {
        /// The number of flaky test records restored.
        flaky_tests: usize,
    },
}

/// In-memory analytics state for a test suite.
///
/// All state is owned by this value, and all operations are synchronous.
#[derive(Clone, Debug)]
pub struct TestAnalytics {
    config: AnalyticsConfig,
    store: Option<HistoryStore>,
    runs: VecDeque<TestRun>,
    tests: BTreeMap<TestId, TestRecord>,
    files: BTreeMap<Utf8PathBuf, FileStats>,
    failures: BTreeMap<TestId, TestFailures>,
    metrics: Metrics,
    // Latest statuses of tests restored from a snapshot and not yet seen
    // again.
    last_statuses: BTreeMap<TestId, TestStatus>,
}

impl TestAnalytics {
    /// Creates empty analytics that persist to `store`.
    ///
    /// Nothing is loaded; call [`Self::load_history`] to restore a previous
    /// snapshot.
    pub fn new(config: AnalyticsConfig, store: HistoryStore) -> Self {
        Self::new_impl(config, Some(store))
    }

    /// Creates empty analytics that are never persisted.
    pub fn in_memory(config: AnalyticsConfig) -> Self {
        Self::new_impl(config, None)
    }

    fn new_impl(config: AnalyticsConfig, store: Option<HistoryStore>) -> Self {
        Self {
            config,
            store,
            runs: VecDeque::new(),
            tests: BTreeMap::new(),
            files: BTreeMap::new(),
            failures: BTreeMap::new(),
            metrics: Metrics::default(),
            last_statuses: BTreeMap::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Returns the store, if any.
    pub fn store(&self) -> Option<&HistoryStore> {
        self.store.as_ref()
    }

    /// Returns the recorded runs, oldest first.
    pub fn runs(&self) -> &VecDeque<TestRun> {
        &self.runs
    }

    /// Returns the per-test records.
    pub fn tests(&self) -> &BTreeMap<TestId, TestRecord> {
        &self.tests
    }

    /// Returns the per-file tallies.
    pub fn files(&self) -> &BTreeMap<Utf8PathBuf, FileStats> {
        &self.files
    }

    /// Returns the failure patterns of every test that has failed.
    pub fn failures(&self) -> &BTreeMap<TestId, TestFailures> {
        &self.failures
    }

    /// Returns the suite-wide metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Records a completed run.
    ///
    /// A run without test results is ignored. Otherwise the run is stamped
    /// with the current time if it has no timestamp, appended to the history
    /// (evicting the oldest run if the history is full), metrics are
    /// recomputed, every result is processed, and the snapshot is saved.
    ///
    /// An error means the in-memory state was updated but the snapshot could
    /// not be saved.
    pub fn record_run(&mut self, mut run: TestRun) -> Result<RecordOutcome, SaveError> {
        if run.is_empty() {
            debug!("ignoring run with no test results");
            return Ok(RecordOutcome::Empty);
        }

        let timestamp = *run.timestamp.get_or_insert_with(Utc::now);
        let results = run.tests.clone();

        self.runs.push_back(run);
        while self.runs.len() > self.config.max_runs {
            self.runs.pop_front();
        }
        self.update_metrics();

        for result in &results {
            self.process_test(result, timestamp);
        }

        debug!(
            "recorded run with {} results ({} runs in history)",
            results.len(),
            self.runs.len(),
        );

        self.save_history()?;
        Ok(RecordOutcome::Recorded)
    }

    /// Folds a single result into the per-test and per-file statistics.
    pub fn process_test(&mut self, result: &TestResult, timestamp: DateTime<Utc>) {
        let id = result.id();
        let pattern =
            (result.status == TestStatus::Fail).then(|| extract_pattern(result.message.as_deref()));

        let record = self.tests.entry(id.clone()).or_insert_with(|| {
            let mut record = TestRecord::new(result);
            record.last_status = self.last_statuses.remove(&id);
            record
        });
        let observation = record.observe(
            result,
            timestamp,
            pattern.as_deref(),
            self.config.max_test_history,
        );

        if let Some(pattern) = pattern {
            self.failures
                .entry(id.clone())
                .or_insert_with(|| TestFailures::new(result))
                .observe(result, &pattern);
            *self.metrics.failure_patterns.entry(pattern).or_default() += 1;
        }
        if observation.became_flaky {
            debug!("test {id} flagged as flaky");
        }
        if record.flaky {
            self.metrics.flaky_tests.insert(id, record.clone());
        }

        self.files
            .entry(result.file.clone())
            .or_default()
            .observe(result.status, timestamp);
    }

    /// Recomputes the history-derived metrics.
    pub fn update_metrics(&mut self) {
        self.metrics
            .recompute(&self.runs, self.config.recent_window);
    }

    /// Returns the records of tests flagged flaky.
    pub fn flaky_records(&self) -> impl Iterator<Item = (&TestId, &TestRecord)> {
        self.tests.iter().filter(|(_, record)| record.flaky)
    }

    /// Builds the snapshot that [`Self::save_history`] writes.
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let tests = self
            .flaky_records()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();

        let mut last_statuses = self.last_statuses.clone();
        last_statuses.extend(self.tests.iter().filter_map(|(id, record)| {
            match (record.flaky, record.last_status) {
                (false, Some(status)) => Some((id.clone(), status)),
                _ => None,
            }
        }));

        AnalyticsSnapshot {
            runs: self.runs.iter().map(TestRun::summary).collect(),
            files: self.files.clone(),
            last_statuses,
            failures: self.failures.clone(),
            ..AnalyticsSnapshot::new(self.metrics.clone(), tests, Utc::now())
        }
    }

    /// Saves the metrics and flaky test records.
    ///
    /// Does nothing for in-memory analytics.
    pub fn save_history(&self) -> Result<(), SaveError> {
        match &self.store {
            Some(store) => store.save(&self.snapshot()),
            None => Ok(()),
        }
    }

    /// Loads a previously saved snapshot.
    ///
    /// On success, the metrics, run summaries, file tallies and failure
    /// patterns are replaced and the flaky test records are restored into the
    /// per-test table. The latest statuses of other tests are kept so that a
    /// flip is detected the next time they are observed. Run-derived metrics
    /// are recomputed, since the configured history size may have shrunk. On
    /// error, state is unchanged.
    pub fn load_history(&mut self) -> Result<LoadOutcome, LoadError> {
        let Some(store) = &self.store else {
            return Ok(LoadOutcome::NotFound);
        };
        let Some(snapshot) = store.load()? else {
            return Ok(LoadOutcome::NotFound);
        };

        let flaky_tests = snapshot.tests.len();
        self.metrics = snapshot.metrics;
        self.tests.extend(snapshot.tests);
        self.runs = snapshot.runs;
        while self.runs.len() > self.config.max_runs {
            self.runs.pop_front();
        }
        self.update_metrics();
        self.files = snapshot.files;
        self.failures = snapshot.failures;
        self.last_statuses = snapshot.last_statuses;
        Ok(LoadOutcome::Loaded { flaky_tests })
    }

    /// Resets all state and removes the snapshot file.
    pub fn clear_history(&mut self) -> Result<(), ClearError> {
        self.runs.clear();
        self.tests.clear();
        self.files.clear();
        self.failures.clear();
        self.last_statuses.clear();
        self.metrics = Metrics::default();
        match &self.store {
            Some(store) => store.clear(),
            None => Ok(()),
        }
    }
}
