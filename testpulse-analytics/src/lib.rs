// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for testpulse: recording test runs, detecting flaky
//! tests, and rendering text dashboards.
//!
//! The flow of operations is:
//!
//! 1. An external test runner produces a [`TestRun`](run::TestRun).
//! 2. [`TestAnalytics::record_run`](analytics::TestAnalytics::record_run)
//!    appends it to the bounded run history, recomputes
//!    [`Metrics`](metrics::Metrics) and updates per-test
//!    [`TestRecord`](record::TestRecord)s.
//! 3. A snapshot is written through the [`HistoryStore`](store::HistoryStore).
//! 4. The [`display`] module renders views over the in-memory state on demand.

pub mod analytics;
pub mod display;
pub mod errors;
pub mod helpers;
pub mod metrics;
pub mod pattern;
pub mod record;
pub mod run;
pub mod state_dir;
pub mod store;
#[cfg(test)]
mod test_helpers;
pub mod user_config;
