// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    NO_RUNS, Styles, flaky_by_failure_ratio, format_timestamp, patterns_by_count, write_header,
};
use crate::{
    analytics::TestAnalytics,
    helpers::{DisplayDuration, DisplayPercent, ThemeCharacters, plural},
};
use owo_colors::OwoColorize;
use std::fmt;

/// Displays recent pass-rate and duration trends, along with the top flaky
/// tests and failure patterns.
///
/// Created by [`TestAnalytics::display_trends`].
#[derive(Clone, Debug)]
pub struct DisplayTrends<'a> {
    analytics: &'a TestAnalytics,
    styles: &'a Styles,
    theme: &'a ThemeCharacters,
}

impl<'a> DisplayTrends<'a> {
    pub(super) fn new(
        analytics: &'a TestAnalytics,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> Self {
        Self {
            analytics,
            styles,
            theme,
        }
    }

    fn write_runs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let runs = self.analytics.runs();
        let window = self.analytics.config().recent_window.min(runs.len());
        let title = format!("Test trends (last {window} {})", plural::runs_str(window));
        write_header(f, &title, self.styles, self.theme)?;

        for run in runs.iter().skip(runs.len() - window) {
            let timestamp = run
                .timestamp
                .map_or_else(|| "-".to_owned(), format_timestamp);
            let duration = run
                .duration()
                .map_or_else(|| "-".to_owned(), |d| DisplayDuration(d).to_string());
            let rate_style = if run.failed > 0 {
                self.styles.fail
            } else {
                self.styles.pass
            };
            writeln!(
                f,
                "  {timestamp:<19}  {}/{} passed  {:>6}  {duration}",
                run.passed.style(self.styles.count),
                run.total.style(self.styles.count),
                DisplayPercent(run.pass_ratio() * 100.0).style(rate_style),
            )?;
        }
        Ok(())
    }

    fn write_flaky(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, "Top flaky tests", self.styles, self.theme)?;
        let flaky = flaky_by_failure_ratio(self.analytics);
        if flaky.is_empty() {
            return writeln!(f, "  (none)");
        }
        for (index, (id, record)) in flaky
            .into_iter()
            .take(self.analytics.config().top_n)
            .enumerate()
        {
            writeln!(
                f,
                "  {}. {} ({id}): {}/{} failed ({})",
                index + 1,
                record.name.style(self.styles.test_name),
                record.failures.style(self.styles.count),
                record.runs.style(self.styles.count),
                DisplayPercent(record.failure_ratio() * 100.0),
            )?;
        }
        Ok(())
    }

    fn write_patterns(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, "Top failure patterns", self.styles, self.theme)?;
        let patterns = patterns_by_count(self.analytics);
        if patterns.is_empty() {
            return writeln!(f, "  (none)");
        }
        for (index, (pattern, count)) in patterns
            .into_iter()
            .take(self.analytics.config().top_n)
            .enumerate()
        {
            writeln!(
                f,
                "  {}. {} ({} {})",
                index + 1,
                pattern.style(self.styles.pattern),
                count.style(self.styles.count),
                plural::occurrences_str(count),
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTrends<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.analytics.runs().is_empty() {
            return writeln!(f, "{NO_RUNS}");
        }

        self.write_runs(f)?;
        writeln!(f)?;
        self.write_flaky(f)?;
        writeln!(f)?;
        self.write_patterns(f)
    }
}
