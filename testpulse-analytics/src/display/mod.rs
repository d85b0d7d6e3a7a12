// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text dashboards over analytics state.
//!
//! Every view is a display wrapper borrowing a [`TestAnalytics`]: rendering
//! never mutates state. Views are created through the `display_*` methods on
//! [`TestAnalytics`].

mod dashboard;
mod files;
mod flaky;
mod patterns;
mod trends;

pub use dashboard::DisplayDashboard;
pub use files::DisplayFiles;
pub use flaky::DisplayFlakyTests;
pub use patterns::DisplayFailurePatterns;
pub use trends::DisplayTrends;

use crate::{
    analytics::TestAnalytics, helpers::ThemeCharacters, metrics::Health, record::TestRecord,
    run::TestId,
};
use chrono::{DateTime, Local, Utc};
use owo_colors::{OwoColorize, Style};
use std::fmt;

/// Styles for displaying analytics.
#[derive(Clone, Debug, Default)]
pub struct Styles {
    /// Style for section headers.
    pub section: Style,
    /// Style for field labels.
    pub label: Style,
    /// Style for counts and numbers.
    pub count: Style,
    /// Style for test names.
    pub test_name: Style,
    /// Style for failure patterns.
    pub pattern: Style,
    /// Style for "pass" results.
    pub pass: Style,
    /// Style for "fail" results.
    pub fail: Style,
    /// Style for "skip" results.
    pub skip: Style,
    /// Style for "Good" health.
    pub good: Style,
    /// Style for "Declining" health.
    pub declining: Style,
    /// Style for "Poor" health.
    pub poor: Style,
}

impl Styles {
    /// Colorizes the styles for terminal output.
    pub fn colorize(&mut self) {
        self.section = Style::new().bold();
        self.label = Style::new().bold();
        self.count = Style::new().bold();
        self.test_name = Style::new().bold().blue();
        self.pattern = Style::new().yellow();
        self.pass = Style::new().green();
        self.fail = Style::new().red();
        self.skip = Style::new().yellow();
        self.good = Style::new().bold().green();
        self.declining = Style::new().bold().yellow();
        self.poor = Style::new().bold().red();
    }

    fn health(&self, health: Health) -> Style {
        match health {
            Health::Good => self.good,
            Health::Declining => self.declining,
            Health::Poor => self.poor,
        }
    }
}

impl TestAnalytics {
    /// Displays recent pass rates and durations, the top flaky tests and the
    /// top failure patterns.
    pub fn display_trends<'a>(
        &'a self,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> DisplayTrends<'a> {
        DisplayTrends::new(self, styles, theme)
    }

    /// Displays every flaky test in detail.
    pub fn display_flaky_tests<'a>(
        &'a self,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> DisplayFlakyTests<'a> {
        DisplayFlakyTests::new(self, styles, theme)
    }

    /// Displays failure patterns along with the tests exhibiting them.
    ///
    /// If `pattern` is given, only that pattern is shown.
    pub fn display_failure_patterns<'a>(
        &'a self,
        pattern: Option<&'a str>,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> DisplayFailurePatterns<'a> {
        DisplayFailurePatterns::new(self, pattern, styles, theme)
    }

    /// Displays the compact dashboard: headline metrics, a pass-rate graph
    /// and the health classification.
    pub fn display_dashboard<'a>(
        &'a self,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> DisplayDashboard<'a> {
        DisplayDashboard::new(self, styles, theme)
    }

    /// Displays per-file tallies.
    pub fn display_files<'a>(
        &'a self,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> DisplayFiles<'a> {
        DisplayFiles::new(self, styles, theme)
    }
}

const NO_RUNS: &str = "no test runs recorded";

fn write_header(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    styles: &Styles,
    theme: &ThemeCharacters,
) -> fmt::Result {
    writeln!(f, "{}", title.style(styles.section))?;
    writeln!(f, "{}", theme.hbar(title.chars().count()))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Returns flaky tests ordered by descending failure ratio, ties broken by ID.
fn flaky_by_failure_ratio(analytics: &TestAnalytics) -> Vec<(&TestId, &TestRecord)> {
    let mut flaky: Vec<_> = analytics.metrics().flaky_tests.iter().collect();
    flaky.sort_by(|(a_id, a), (b_id, b)| {
        b.failure_ratio()
            .total_cmp(&a.failure_ratio())
            .then_with(|| a_id.cmp(b_id))
    });
    flaky
}

/// Returns failure patterns ordered by descending count, ties broken by
/// pattern.
fn patterns_by_count(analytics: &TestAnalytics) -> Vec<(&str, usize)> {
    let mut patterns: Vec<_> = analytics
        .metrics()
        .failure_patterns
        .iter()
        .map(|(pattern, count)| (pattern.as_str(), *count))
        .collect();
    patterns.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_helpers::run_with, user_config::AnalyticsConfig};

    #[test]
    fn views_without_runs() {
        let analytics = TestAnalytics::in_memory(AnalyticsConfig::default());
        let styles = Styles::default();
        let theme = ThemeCharacters::default();

        assert_eq!(
            analytics.display_trends(&styles, &theme).to_string(),
            "no test runs recorded\n"
        );
        assert_eq!(
            analytics.display_dashboard(&styles, &theme).to_string(),
            "no test runs recorded\n"
        );
        assert_eq!(
            analytics.display_flaky_tests(&styles, &theme).to_string(),
            "no flaky tests\n"
        );
        assert_eq!(
            analytics
                .display_failure_patterns(None, &styles, &theme)
                .to_string(),
            "no failure patterns recorded\n"
        );
        assert_eq!(
            analytics.display_files(&styles, &theme).to_string(),
            "no test files recorded\n"
        );
    }

    #[test]
    fn colorized_output_contains_escapes() {
        let mut analytics = TestAnalytics::in_memory(AnalyticsConfig::default());
        analytics.record_run(run_with(0, 1, 1)).unwrap();
        let mut styles = Styles::default();
        styles.colorize();
        let theme = ThemeCharacters::default();

        let plain = analytics
            .display_dashboard(&Styles::default(), &theme)
            .to_string();
        let colored = analytics.display_dashboard(&styles, &theme).to_string();
        assert!(!plain.contains('\u{1b}'));
        assert!(colored.contains('\u{1b}'));
    }
}
