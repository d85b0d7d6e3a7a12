// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios through the public API: recording runs, persisting
//! them and restoring them in a fresh instance.

use camino_tempfile::Utf8TempDir;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;
use test_strategy::proptest;
use testpulse_analytics::{
    analytics::{LoadOutcome, RecordOutcome, TestAnalytics},
    display::Styles,
    helpers::{DisplayPercent, ThemeCharacters},
    metrics::Health,
    run::{TestResult, TestRun, TestStatus},
    store::HistoryStore,
    user_config::AnalyticsConfig,
};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + TimeDelta::minutes(minutes)
}

fn run(minutes: i64, results: Vec<TestResult>) -> TestRun {
    TestRun::from_results(results)
        .with_times(at(minutes), at(minutes) + TimeDelta::seconds(2))
        .with_timestamp(at(minutes))
}

fn parse(status: TestStatus) -> TestResult {
    let result = TestResult::new("parses_header", "tests/parse.rs", 42, status);
    match status {
        TestStatus::Fail => result.with_message("expected 3 fields, got 2"),
        _ => result,
    }
}

fn other(status: TestStatus) -> TestResult {
    TestResult::new("renders", "tests/render.rs", 7, status)
}

#[test]
fn pass_rate_is_mean_of_run_ratios() {
    let mut analytics = TestAnalytics::in_memory(AnalyticsConfig::default());
    // Ratios 1.0, 0.5 and 1.0 from runs of different sizes.
    analytics
        .record_run(run(0, vec![parse(TestStatus::Pass)]))
        .unwrap();
    analytics
        .record_run(run(
            1,
            vec![parse(TestStatus::Fail), other(TestStatus::Pass)],
        ))
        .unwrap();
    analytics
        .record_run(run(
            2,
            vec![
                parse(TestStatus::Pass),
                other(TestStatus::Pass),
                TestResult::new("a", "tests/a.rs", 1, TestStatus::Pass),
                TestResult::new("b", "tests/b.rs", 1, TestStatus::Pass),
            ],
        ))
        .unwrap();

    let metrics = analytics.metrics();
    assert_eq!(metrics.total_runs, 3);
    assert_eq!(DisplayPercent(metrics.pass_rate).to_string(), "83.3%");
    assert_eq!(DisplayPercent(metrics.recent_pass_rate).to_string(), "83.3%");
    assert_eq!(metrics.total_duration, std::time::Duration::from_secs(6));
    assert_eq!(
        metrics.run_frequency.values().sum::<usize>(),
        3,
        "every run is counted on some day"
    );
}

#[test]
fn flaky_after_status_flip() {
    let mut analytics = TestAnalytics::in_memory(AnalyticsConfig::default());
    let statuses = [TestStatus::Pass, TestStatus::Pass, TestStatus::Fail];
    for (minutes, status) in statuses.into_iter().enumerate() {
        analytics
            .record_run(run(minutes as i64, vec![parse(status)]))
            .unwrap();
        let record = analytics.tests().values().next().unwrap();
        assert_eq!(record.flaky, minutes == 2, "after run {minutes}");
    }

    let record = analytics.tests().values().next().unwrap();
    assert_eq!((record.runs, record.passes, record.failures), (3, 2, 1));
    assert_eq!(
        record.patterns,
        BTreeMap::from([("expected N fields, got N".to_owned(), 1)])
    );
    assert_eq!(analytics.metrics().flaky_tests.len(), 1);
}

#[test]
fn empty_run_changes_nothing() {
    let temp_dir = Utf8TempDir::new().unwrap();
    let store = HistoryStore::new(temp_dir.path());
    let mut analytics = TestAnalytics::new(AnalyticsConfig::default(), store.clone());

    assert_eq!(
        analytics.record_run(TestRun::default()).unwrap(),
        RecordOutcome::Empty
    );
    assert!(analytics.runs().is_empty());
    assert_eq!(analytics.metrics().total_runs, 0);
    assert!(!store.path().exists(), "nothing is written for an empty run");
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = Utf8TempDir::new().unwrap();
    let store = HistoryStore::new(temp_dir.path());

    let mut analytics = TestAnalytics::new(AnalyticsConfig::default(), store.clone());
    for (minutes, status) in [TestStatus::Pass, TestStatus::Fail, TestStatus::Pass]
        .into_iter()
        .enumerate()
    {
        analytics
            .record_run(run(
                minutes as i64,
                vec![parse(status), other(TestStatus::Pass)],
            ))
            .unwrap();
    }

    let mut restored = TestAnalytics::new(AnalyticsConfig::default(), store);
    assert_eq!(
        restored.load_history().unwrap(),
        LoadOutcome::Loaded { flaky_tests: 1 }
    );
    assert_eq!(restored.metrics(), analytics.metrics());

    let flaky: Vec<_> = analytics.flaky_records().collect();
    let restored_flaky: Vec<_> = restored.flaky_records().collect();
    assert_eq!(restored_flaky, flaky);
    // Non-flaky tests are not restored in detail.
    assert_eq!(restored.tests().len(), 1);
    assert_eq!(restored.files(), analytics.files());

    let styles = Styles::default();
    let theme = ThemeCharacters::default();
    assert_eq!(
        restored.display_dashboard(&styles, &theme).to_string(),
        analytics.display_dashboard(&styles, &theme).to_string(),
    );
}

#[test]
fn health_from_recorded_runs() {
    let mut config = AnalyticsConfig::default();
    config.recent_window = 3;
    let mut analytics = TestAnalytics::in_memory(config);
    for minutes in 0..10 {
        analytics
            .record_run(run(
                minutes,
                vec![parse(TestStatus::Pass), other(TestStatus::Pass)],
            ))
            .unwrap();
    }
    assert_eq!(analytics.metrics().health(), Health::Good);

    analytics
        .record_run(run(
            10,
            vec![
                parse(TestStatus::Fail),
                other(TestStatus::Pass),
                TestResult::new("a", "tests/a.rs", 1, TestStatus::Pass),
                TestResult::new("b", "tests/b.rs", 1, TestStatus::Pass),
            ],
        ))
        .unwrap();
    // Recent is 91.7%: above the floor, but below 95% of the all-time 97.7%.
    assert_eq!(analytics.metrics().health(), Health::Declining);

    analytics
        .record_run(run(
            11,
            vec![parse(TestStatus::Fail), other(TestStatus::Fail)],
        ))
        .unwrap();
    assert_eq!(analytics.metrics().health(), Health::Poor);
}

#[derive(Clone, Copy, Debug, test_strategy::Arbitrary)]
enum Step {
    Pass,
    Fail,
    Skip,
    Empty,
}

#[proptest(cases = 128)]
fn invariants_hold_for_any_sequence(
    #[strategy(proptest::collection::vec(any::<Step>(), 0..60))] steps: Vec<Step>,
) {
    let mut config = AnalyticsConfig::default();
    config.max_runs = 16;
    config.max_test_history = 5;
    let mut analytics = TestAnalytics::in_memory(config);

    let mut recorded = 0usize;
    let mut was_flaky = false;
    for (minutes, step) in steps.into_iter().enumerate() {
        let results = match step {
            Step::Pass => vec![parse(TestStatus::Pass)],
            Step::Fail => vec![parse(TestStatus::Fail)],
            Step::Skip => vec![parse(TestStatus::Skip)],
            Step::Empty => Vec::new(),
        };
        let before = analytics.runs().len();
        analytics.record_run(run(minutes as i64, results)).unwrap();

        if matches!(step, Step::Empty) {
            prop_assert_eq!(analytics.runs().len(), before);
            continue;
        }
        recorded += 1;
        prop_assert_eq!(analytics.runs().len(), recorded.min(16));
        prop_assert_eq!(analytics.metrics().total_runs, recorded.min(16));

        let record = analytics.tests().values().next().unwrap();
        prop_assert!(record.passes + record.failures <= record.runs);
        prop_assert_eq!(record.runs, recorded);
        prop_assert!(record.history.len() <= 5);
        // Once flaky, always flaky.
        prop_assert!(!was_flaky || record.flaky);
        was_flaky = record.flaky;

        let metrics = analytics.metrics();
        prop_assert!((0.0..=100.0).contains(&metrics.pass_rate));
        prop_assert!((0.0..=100.0).contains(&metrics.recent_pass_rate));
    }
}
