// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `show` command.

use super::common::ConfigOpts;
use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputWriter},
};
use clap::{Args, ValueEnum};
use std::io::Write;
use testpulse_analytics::analytics::TestAnalytics;
use tracing::warn;

/// Options for `testpulse show`.
#[derive(Debug, Args)]
pub(crate) struct ShowOpts {
    /// The view to show.
    #[arg(value_enum)]
    view: View,

    /// Only show this failure pattern (`patterns` view only).
    ///
    /// A raw failure message is also accepted, and matched against the
    /// pattern it normalizes to.
    #[arg(long, value_name = "PATTERN")]
    pattern: Option<String>,
}

/// A dashboard view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum View {
    /// Recent pass rates and durations, top flaky tests and top failure
    /// patterns.
    Trends,
    /// Every flaky test in detail.
    Flaky,
    /// Failure patterns and the tests exhibiting them.
    Patterns,
    /// Headline metrics, a pass-rate graph and overall health.
    Dashboard,
    /// Per-file result tallies.
    Files,
}

impl ShowOpts {
    pub(crate) fn exec(
        self,
        config_opts: &ConfigOpts,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let analytics = config_opts.load_analytics()?;
        if self.pattern.is_some() && self.view != View::Patterns {
            warn!("--pattern only applies to the `patterns` view, ignoring");
        }

        let rendered = self.render(&analytics, output);
        let mut writer = output_writer.stdout_writer();
        writer
            .write_all(rendered.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutputError { err })?;

        Ok(0)
    }

    fn render(&self, analytics: &TestAnalytics, output: OutputContext) -> String {
        let styles = output.display_styles();
        let theme = output.theme_characters();
        match self.view {
            View::Trends => analytics.display_trends(&styles, &theme).to_string(),
            View::Flaky => analytics.display_flaky_tests(&styles, &theme).to_string(),
            View::Patterns => analytics
                .display_failure_patterns(self.pattern.as_deref(), &styles, &theme)
                .to_string(),
            View::Dashboard => analytics.display_dashboard(&styles, &theme).to_string(),
            View::Files => analytics.display_files(&styles, &theme).to_string(),
        }
    }
}
