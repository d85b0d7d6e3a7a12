// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Styles, write_header};
use crate::{
    analytics::TestAnalytics,
    helpers::{DisplayPercent, ThemeCharacters, plural},
    record::TestRecord,
    run::{TestId, TestStatus},
};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::fmt;

/// Displays every flaky test with its counts, recent results and failure
/// patterns.
///
/// Created by [`TestAnalytics::display_flaky_tests`].
#[derive(Clone, Debug)]
pub struct DisplayFlakyTests<'a> {
    analytics: &'a TestAnalytics,
    styles: &'a Styles,
    theme: &'a ThemeCharacters,
}

impl<'a> DisplayFlakyTests<'a> {
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

    fn write_record(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: &TestId,
        record: &TestRecord,
    ) -> fmt::Result {
        let styles = self.styles;
        writeln!(f, "{}", record.name.style(styles.test_name))?;
        writeln!(f, "  {} {id}", "location:".style(styles.label))?;
        writeln!(
            f,
            "  {} {} ({} passed, {} failed)",
            "runs:".style(styles.label),
            record.runs.style(styles.count),
            record.passes.style(styles.pass),
            record.failures.style(styles.fail),
        )?;
        writeln!(
            f,
            "  {} {}",
            "failure rate:".style(styles.label),
            DisplayPercent(record.failure_ratio() * 100.0),
        )?;

        let recent = record
            .recent_statuses(self.analytics.config().glyph_count)
            .map(|status| {
                let style = match status {
                    TestStatus::Pass => styles.pass,
                    TestStatus::Fail => styles.fail,
                    TestStatus::Skip => styles.skip,
                };
                self.theme.status_glyph(status).style(style).to_string()
            })
            .join(" ");
        writeln!(f, "  {} {recent}", "recent:".style(styles.label))?;

        if !record.patterns.is_empty() {
            writeln!(f, "  {}", "patterns:".style(styles.label))?;
            for (pattern, count) in &record.patterns {
                writeln!(
                    f,
                    "    - {} ({} {})",
                    pattern.style(styles.pattern),
                    count.style(styles.count),
                    plural::occurrences_str(*count),
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DisplayFlakyTests<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flaky = &self.analytics.metrics().flaky_tests;
        if flaky.is_empty() {
            return writeln!(f, "no flaky tests");
        }

        let title = format!("Flaky tests ({})", flaky.len());
        write_header(f, &title, self.styles, self.theme)?;
        for (index, (id, record)) in flaky.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            self.write_record(f, id, record)?;
        }
        Ok(())
    }
}
