// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suite-wide metrics derived from the run history.

use crate::{
    record::TestRecord,
    run::{TestId, TestRun},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    time::Duration,
};

/// Suite-wide metrics.
///
/// `total_runs`, `total_duration`, `pass_rate`, `recent_pass_rate` and
/// `run_frequency` are recomputed from the run history by
/// [`Metrics::recompute`]. `flaky_tests` and `failure_patterns` are
/// accumulated as tests are processed and only ever grow.
///
/// Rates are percentages in `[0, 100]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metrics {
    /// Number of runs in the history.
    pub total_runs: usize,

    /// Sum of the durations of all runs with known start and end times.
    #[serde(with = "humantime_serde")]
    pub total_duration: Duration,

    /// Mean of the per-run pass ratios, as a percentage.
    ///
    /// Every run carries equal weight regardless of how many tests it ran.
    pub pass_rate: f64,

    /// Mean of the per-run pass ratios over the most recent runs.
    pub recent_pass_rate: f64,

    /// Every test that has ever been flagged flaky.
    #[serde(default)]
    pub flaky_tests: BTreeMap<TestId, TestRecord>,

    /// Failure pattern to number of failures across all tests.
    #[serde(default)]
    pub failure_patterns: BTreeMap<String, usize>,

    /// Number of runs per local calendar day.
    #[serde(default)]
    pub run_frequency: BTreeMap<NaiveDate, usize>,
}

impl Metrics {
    /// Recomputes the history-derived metrics.
    ///
    /// The recent pass rate covers the last `recent_window` runs, or all runs
    /// if there are fewer.
    pub fn recompute(&mut self, runs: &VecDeque<TestRun>, recent_window: usize) {
        self.total_runs = runs.len();
        self.total_duration = runs.iter().filter_map(TestRun::duration).sum();
        self.pass_rate = mean_pass_rate(runs.iter());

        let recent = runs.len().min(recent_window);
        self.recent_pass_rate = mean_pass_rate(runs.iter().skip(runs.len() - recent));

        self.run_frequency.clear();
        for run in runs {
            if let Some(timestamp) = run.timestamp {
                let day = timestamp.with_timezone(&Local).date_naive();
                *self.run_frequency.entry(day).or_default() += 1;
            }
        }
    }

    /// Returns the mean duration of runs with known start and end times.
    pub fn mean_duration(runs: &VecDeque<TestRun>) -> Option<Duration> {
        let durations: Vec<_> = runs.iter().filter_map(TestRun::duration).collect();
        let count = u32::try_from(durations.len()).ok().filter(|&n| n > 0)?;
        Some(durations.into_iter().sum::<Duration>() / count)
    }

    /// Classifies the overall health of the suite.
    pub fn health(&self) -> Health {
        Health::classify(
            self.pass_rate,
            self.recent_pass_rate,
            self.flaky_tests.len(),
        )
    }
}

fn mean_pass_rate<'a>(runs: impl ExactSizeIterator<Item = &'a TestRun>) -> f64 {
    let count = runs.len();
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = runs.map(TestRun::pass_ratio).sum();
    sum / count as f64 * 100.0
}

/// A coarse classification of suite health.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Health {
    /// Recent runs pass at a high rate and few tests are flaky.
    Good,
    /// The recent pass rate has dropped noticeably below the all-time rate.
    Declining,
    /// The recent pass rate is low, or many tests are flaky.
    Poor,
}

impl Health {
    /// Recent pass rates below this percentage are poor.
    pub const POOR_PASS_RATE: f64 = 90.0;

    /// More flaky tests than this is poor.
    pub const MAX_FLAKY_TESTS: usize = 3;

    /// A recent pass rate below this fraction of the all-time rate is declining.
    pub const DECLINE_FACTOR: f64 = 0.95;

    /// Classifies health from the pass rates and the number of flaky tests.
    ///
    /// `Poor` takes priority over `Declining`.
    pub fn classify(pass_rate: f64, recent_pass_rate: f64, flaky_count: usize) -> Self {
        if recent_pass_rate < Self::POOR_PASS_RATE || flaky_count > Self::MAX_FLAKY_TESTS {
            Self::Poor
        } else if recent_pass_rate < pass_rate * Self::DECLINE_FACTOR {
            Self::Declining
        } else {
            Self::Good
        }
    }

    /// Returns the label for this classification.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Declining => "Declining",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, run_with};
    use test_case::test_case;

    fn history(runs: impl IntoIterator<Item = TestRun>) -> VecDeque<TestRun> {
        runs.into_iter().collect()
    }

    #[test]
    fn pass_rate_weights_runs_equally() {
        // 1 of 1 and 1 of 9: a global ratio would be 20%, the per-run mean is
        // (100% + 11.1%) / 2.
        let runs = history([run_with(0, 1, 0), run_with(1, 1, 8)]);
        let mut metrics = Metrics::default();
        metrics.recompute(&runs, 10);
        assert_eq!(format!("{:.1}", metrics.pass_rate), "55.6");
    }

    #[test]
    fn recent_window_covers_last_runs() {
        let mut runs = history((0..12).map(|i| run_with(i, 10, 0)));
        runs.push_back(run_with(12, 0, 10));
        runs.push_back(run_with(13, 0, 10));
        let mut metrics = Metrics::default();
        metrics.recompute(&runs, 10);

        assert_eq!(metrics.total_runs, 14);
        assert_eq!(format!("{:.1}", metrics.recent_pass_rate), "80.0");
        assert_eq!(format!("{:.1}", metrics.pass_rate), "85.7");
        assert_eq!(metrics.total_duration, Duration::from_secs(14));
    }

    #[test]
    fn empty_history_is_zero() {
        let mut metrics = Metrics::default();
        metrics.recompute(&VecDeque::new(), 10);
        assert_eq!(metrics, Metrics::default());
        assert_eq!(Metrics::mean_duration(&VecDeque::new()), None);
    }

    #[test]
    fn run_frequency_counts_local_days() {
        let runs = history([run_with(0, 1, 0), run_with(1, 1, 0), run_with(60 * 24, 1, 0)]);
        let mut metrics = Metrics::default();
        metrics.recompute(&runs, 10);

        let mut expected = BTreeMap::new();
        for minutes in [0, 1, 60 * 24] {
            *expected
                .entry(at(minutes).with_timezone(&Local).date_naive())
                .or_insert(0) += 1;
        }
        assert_eq!(metrics.run_frequency, expected);
        assert_eq!(metrics.run_frequency.values().sum::<usize>(), 3);
    }

    #[test]
    fn runs_without_times_add_no_duration() {
        let mut run = run_with(0, 1, 0);
        run.end_time = None;
        let runs = history([run, run_with(1, 1, 0)]);
        let mut metrics = Metrics::default();
        metrics.recompute(&runs, 10);
        assert_eq!(metrics.total_duration, Duration::from_secs(1));
        assert_eq!(Metrics::mean_duration(&runs), Some(Duration::from_secs(1)));
    }

    #[test_case(100.0, 100.0, 0, Health::Good ; "all passing")]
    #[test_case(100.0, 89.9, 0, Health::Poor ; "low recent rate")]
    #[test_case(100.0, 100.0, 4, Health::Poor ; "too many flaky tests")]
    #[test_case(100.0, 100.0, 3, Health::Good ; "three flaky tests is fine")]
    #[test_case(100.0, 94.0, 0, Health::Declining ; "declining")]
    #[test_case(100.0, 85.0, 0, Health::Poor ; "poor wins over declining")]
    #[test_case(95.0, 91.0, 0, Health::Good ; "within five percent")]
    fn classify(pass_rate: f64, recent: f64, flaky: usize, expected: Health) {
        assert_eq!(Health::classify(pass_rate, recent, flaky), expected);
    }
}
