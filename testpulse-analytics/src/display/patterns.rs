// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Styles, patterns_by_count, write_header};
use crate::{
    analytics::TestAnalytics,
    helpers::{ThemeCharacters, plural},
    pattern::extract_pattern,
};
use owo_colors::OwoColorize;
use std::{borrow::Cow, fmt};

/// Displays failure patterns and the tests exhibiting them.
///
/// Created by [`TestAnalytics::display_failure_patterns`].
#[derive(Clone, Debug)]
pub struct DisplayFailurePatterns<'a> {
    analytics: &'a TestAnalytics,
    pattern: Option<&'a str>,
    styles: &'a Styles,
    theme: &'a ThemeCharacters,
}

impl<'a> DisplayFailurePatterns<'a> {
    pub(super) fn new(
        analytics: &'a TestAnalytics,
        pattern: Option<&'a str>,
        styles: &'a Styles,
        theme: &'a ThemeCharacters,
    ) -> Self {
        Self {
            analytics,
            pattern,
            styles,
            theme,
        }
    }

    /// Resolves a user-provided pattern: either a known pattern, or a raw
    /// failure message that normalizes to one.
    fn resolve(&self, pattern: &'a str) -> Option<Cow<'a, str>> {
        let known = &self.analytics.metrics().failure_patterns;
        if known.contains_key(pattern) {
            return Some(Cow::Borrowed(pattern));
        }
        let normalized = extract_pattern(Some(pattern));
        known
            .contains_key(&normalized)
            .then_some(Cow::Owned(normalized))
    }

    fn write_pattern(&self, f: &mut fmt::Formatter<'_>, pattern: &str, count: usize) -> fmt::Result {
        writeln!(
            f,
            "{} ({} {})",
            pattern.style(self.styles.pattern),
            count.style(self.styles.count),
            plural::occurrences_str(count),
        )?;

        let mut tests: Vec<_> = self
            .analytics
            .failures()
            .iter()
            .filter_map(|(id, test)| {
                test.patterns
                    .get(pattern)
                    .map(|&failures| (id, &test.name, failures))
            })
            .collect();
        tests.sort_by(|(a_id, _, a), (b_id, _, b)| b.cmp(a).then_with(|| a_id.cmp(b_id)));

        for (id, name, failures) in tests {
            writeln!(
                f,
                "  - {} ({id}): {} {}",
                name.style(self.styles.test_name),
                failures.style(self.styles.fail),
                plural::failures_str(failures),
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayFailurePatterns<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pattern) = self.pattern {
            let Some(resolved) = self.resolve(pattern) else {
                return writeln!(f, "no failures matching pattern `{pattern}`");
            };
            let count = self.analytics.metrics().failure_patterns[resolved.as_ref()];
            write_header(f, "Failure pattern", self.styles, self.theme)?;
            return self.write_pattern(f, &resolved, count);
        }

        let patterns = patterns_by_count(self.analytics);
        if patterns.is_empty() {
            return writeln!(f, "no failure patterns recorded");
        }

        let title = format!("Failure patterns ({})", patterns.len());
        write_header(f, &title, self.styles, self.theme)?;
        for (index, (pattern, count)) in patterns.into_iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            self.write_pattern(f, pattern, count)?;
        }
        Ok(())
    }
}
