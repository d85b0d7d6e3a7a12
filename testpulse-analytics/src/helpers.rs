// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for testpulse.

use crate::run::TestStatus;
use std::{fmt, time::Duration};

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "run" if `count` is 1, otherwise "runs".
    pub fn runs_str(count: usize) -> &'static str {
        if count == 1 { "run" } else { "runs" }
    }

    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "failure" if `count` is 1, otherwise "failures".
    pub fn failures_str(count: usize) -> &'static str {
        if count == 1 { "failure" } else { "failures" }
    }

    /// Returns "occurrence" if `count` is 1, otherwise "occurrences".
    pub fn occurrences_str(count: usize) -> &'static str {
        if count == 1 {
            "occurrence"
        } else {
            "occurrences"
        }
    }
}

/// Characters used for drawing dashboards.
#[derive(Clone, Debug)]
pub struct ThemeCharacters {
    hbar: char,
    use_unicode: bool,
}

impl Default for ThemeCharacters {
    fn default() -> Self {
        Self {
            hbar: '-',
            use_unicode: false,
        }
    }
}

impl ThemeCharacters {
    /// Switches to Unicode characters for richer terminal output.
    pub fn use_unicode(&mut self) {
        self.hbar = '─';
        self.use_unicode = true;
    }

    /// Returns a horizontal bar of the specified width.
    pub fn hbar(&self, width: usize) -> String {
        std::iter::repeat_n(self.hbar, width).collect()
    }

    /// Returns the glyph for a test status: `✓ ✗ ○` or `P F S`.
    pub fn status_glyph(&self, status: TestStatus) -> char {
        match (status, self.use_unicode) {
            (TestStatus::Pass, true) => '✓',
            (TestStatus::Fail, true) => '✗',
            (TestStatus::Skip, true) => '○',
            (TestStatus::Pass, false) => 'P',
            (TestStatus::Fail, false) => 'F',
            (TestStatus::Skip, false) => 'S',
        }
    }

    /// Returns the glyph for a plotted point: `●` or `*`.
    pub fn graph_point(&self) -> char {
        if self.use_unicode { '●' } else { '*' }
    }

    /// Returns the glyph connecting a plotted point to the next one: `│` or
    /// `|`.
    pub fn graph_line(&self) -> char {
        if self.use_unicode { '│' } else { '|' }
    }

    /// Returns the vertical axis character: `┤` or `|`.
    pub fn graph_axis(&self) -> char {
        if self.use_unicode { '┤' } else { '|' }
    }

    /// Returns the corner joining the vertical and horizontal axes: `└` or
    /// `+`.
    pub fn graph_corner(&self) -> char {
        if self.use_unicode { '└' } else { '+' }
    }
}

/// Displays a percentage with one decimal digit, e.g. `83.3%`.
///
/// Honors the width and alignment of the formatter.
#[derive(Clone, Copy, Debug)]
pub struct DisplayPercent(pub f64);

impl fmt::Display for DisplayPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:.1}%", self.0))
    }
}

/// Displays a duration in seconds with three decimal digits, e.g. `1.250s`.
#[derive(Clone, Copy, Debug)]
pub struct DisplayDuration(pub Duration);

impl fmt::Display for DisplayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_one_digit() {
        assert_eq!(DisplayPercent(250.0 / 3.0).to_string(), "83.3%");
        assert_eq!(DisplayPercent(100.0).to_string(), "100.0%");
        assert_eq!(DisplayPercent(0.0).to_string(), "0.0%");
        assert_eq!(format!("{:>7}", DisplayPercent(50.0)), "  50.0%");
    }

    #[test]
    fn duration_display() {
        assert_eq!(
            DisplayDuration(Duration::from_millis(1250)).to_string(),
            "1.250s"
        );
    }

    #[test]
    fn glyphs() {
        let mut theme = ThemeCharacters::default();
        assert_eq!(theme.status_glyph(TestStatus::Fail), 'F');
        assert_eq!(theme.hbar(3), "---");
        theme.use_unicode();
        assert_eq!(theme.status_glyph(TestStatus::Pass), '✓');
        assert_eq!(theme.hbar(2), "──");
    }
}
