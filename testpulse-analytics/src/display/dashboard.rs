// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{NO_RUNS, Styles, write_header};
use crate::{
    analytics::TestAnalytics,
    helpers::{DisplayDuration, DisplayPercent, ThemeCharacters, plural},
};
use owo_colors::OwoColorize;
use std::fmt;
use swrite::{SWrite, swrite};

/// The lowest value on the graph's scale sits this many points below the
/// lowest plotted pass rate.
const GRAPH_MARGIN: f64 = 10.0;

/// Each plotted run takes up this many columns.
const COLUMN_WIDTH: usize = 3;

/// Width of the graph's axis labels.
const LABEL_WIDTH: usize = 7;

/// Displays headline metrics, a pass-rate graph and the health
/// classification.
///
/// Created by [`TestAnalytics::display_dashboard`].
#[derive(Clone, Debug)]
pub struct DisplayDashboard<'a> {
    analytics: &'a TestAnalytics,
    styles: &'a Styles,
    theme: &'a ThemeCharacters,
}

impl<'a> DisplayDashboard<'a> {
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

    fn write_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = self.analytics.metrics();
        let styles = self.styles;
        write_header(f, "Test dashboard", styles, self.theme)?;
        writeln!(
            f,
            "  {}      {}",
            "runs:".style(styles.label),
            metrics.total_runs.style(styles.count),
        )?;
        writeln!(
            f,
            "  {}  {}",
            "duration:".style(styles.label),
            DisplayDuration(metrics.total_duration),
        )?;
        writeln!(
            f,
            "  {} {}",
            "pass rate:".style(styles.label),
            DisplayPercent(metrics.pass_rate),
        )?;
        writeln!(
            f,
            "  {}    {}",
            "recent:".style(styles.label),
            DisplayPercent(metrics.recent_pass_rate),
        )?;
        let flaky_count = metrics.flaky_tests.len();
        writeln!(
            f,
            "  {}     {} {}",
            "flaky:".style(styles.label),
            flaky_count.style(styles.count),
            plural::tests_str(flaky_count),
        )
    }

    fn write_graph(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.analytics.config();
        let runs = self.analytics.runs();
        let skip = runs.len().saturating_sub(config.graph_points);
        let points: Vec<f64> = runs
            .iter()
            .skip(skip)
            .map(|run| run.pass_ratio() * 100.0)
            .collect();

        let title = format!(
            "Pass rate (last {} {})",
            points.len(),
            plural::runs_str(points.len()),
        );
        write_header(f, &title, self.styles, self.theme)?;
        for line in graph_lines(&points, config.graph_height, self.theme) {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayDashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.analytics.runs().is_empty() {
            return writeln!(f, "{NO_RUNS}");
        }

        self.write_summary(f)?;
        writeln!(f)?;
        self.write_graph(f)?;
        writeln!(f)?;

        let health = self.analytics.metrics().health();
        writeln!(
            f,
            "{} {}",
            "Health:".style(self.styles.section),
            health.style(self.styles.health(health)),
        )
    }
}

/// Renders pass rates (percentages) as a point graph, `height` rows tall.
///
/// The scale runs from 100% at the top down to [`GRAPH_MARGIN`] points below
/// the lowest value, floored at 0%. Consecutive points are joined by a
/// vertical line in the earlier point's column. Lines carry no trailing
/// whitespace.
pub(crate) fn graph_lines(points: &[f64], height: usize, theme: &ThemeCharacters) -> Vec<String> {
    let top = 100.0;
    let min = points.iter().copied().fold(top, f64::min);
    let bottom = (min - GRAPH_MARGIN).max(0.0);
    let last_row = height.saturating_sub(1);

    // The row each point is plotted on, with row 0 at the top.
    let rows: Vec<usize> = points
        .iter()
        .map(|&value| {
            let offset = (top - value.clamp(bottom, top)) / (top - bottom);
            (offset * last_row as f64).round() as usize
        })
        .collect();

    let mut lines = Vec::with_capacity(height + 1);
    for row in 0..height {
        let mut line = String::new();
        if row == 0 || row == last_row {
            let label = if row == 0 { top } else { bottom };
            swrite!(
                line,
                "{:>width$} {}",
                DisplayPercent(label),
                theme.graph_axis(),
                width = LABEL_WIDTH,
            );
        } else {
            swrite!(line, "{:width$} {}", "", theme.graph_line(), width = LABEL_WIDTH);
        }

        for (index, &point_row) in rows.iter().enumerate() {
            let glyph = if point_row == row {
                theme.graph_point()
            } else if let Some(&next_row) = rows.get(index + 1)
                && point_row.min(next_row) < row
                && row < point_row.max(next_row)
            {
                theme.graph_line()
            } else {
                ' '
            };
            swrite!(line, " {glyph} ");
        }

        lines.push(line.trim_end().to_owned());
    }

    let mut axis = String::new();
    swrite!(
        axis,
        "{:width$} {}{}",
        "",
        theme.graph_corner(),
        theme.hbar(COLUMN_WIDTH * points.len()),
        width = LABEL_WIDTH,
    );
    lines.push(axis);
    lines
}
