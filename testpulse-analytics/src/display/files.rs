// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Styles, format_timestamp, write_header};
use crate::{
    analytics::TestAnalytics,
    helpers::{ThemeCharacters, plural},
};
use owo_colors::OwoColorize;
use std::fmt;

/// Displays per-file result tallies, ordered by path.
///
/// Created by [`TestAnalytics::display_files`].
#[derive(Clone, Debug)]
pub struct DisplayFiles<'a> {
    analytics: &'a TestAnalytics,
    styles: &'a Styles,
    theme: &'a ThemeCharacters,
}

impl<'a> DisplayFiles<'a> {
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
}

impl fmt::Display for DisplayFiles<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = self.analytics.files();
        if files.is_empty() {
            return writeln!(f, "no test files recorded");
        }

        let title = format!("Test files ({})", files.len());
        write_header(f, &title, self.styles, self.theme)?;

        let path_width = files
            .keys()
            .map(|path| path.as_str().chars().count())
            .max()
            .unwrap_or(0);
        for (path, stats) in files {
            let last_run = stats
                .last_run
                .map_or_else(|| "-".to_owned(), format_timestamp);
            writeln!(
                f,
                "  {:path_width$}  {} {}, {} passed, {} failed, last run {last_run}",
                path.as_str(),
                stats.tests.style(self.styles.count),
                plural::tests_str(stats.tests),
                stats.passes.style(self.styles.pass),
                stats.failures.style(self.styles.fail),
            )?;
        }
        Ok(())
    }
}
