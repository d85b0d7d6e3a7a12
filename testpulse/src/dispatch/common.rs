// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options shared by every subcommand.

use crate::{Result, output::OutputOpts};
use camino::Utf8PathBuf;
use clap::Args;
use testpulse_analytics::{
    analytics::{LoadOutcome, TestAnalytics},
    errors::DisplayErrorChain,
    state_dir::analytics_state_dir,
    store::HistoryStore,
    user_config::{AnalyticsConfig, UserConfigLocation},
};
use tracing::{debug, warn};

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub(crate) struct CommonOpts {
    #[clap(flatten)]
    pub(crate) output: OutputOpts,

    #[clap(flatten)]
    pub(crate) config_opts: ConfigOpts,
}

/// Where configuration and state are read from.
#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
pub(crate) struct ConfigOpts {
    /// User config file, or `none` to use built-in defaults only
    /// [default: ~/.config/testpulse/config.toml].
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "TESTPULSE_CONFIG_FILE"
    )]
    pub(crate) config_file: Option<String>,

    /// Directory the analytics snapshot is stored in.
    ///
    /// Takes precedence over the TESTPULSE_STATE_DIR environment variable and
    /// the platform state directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) state_dir: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    /// Loads the user config, resolved against the built-in defaults.
    pub(crate) fn load_config(&self) -> Result<AnalyticsConfig> {
        let location = UserConfigLocation::from_cli_or_env(self.config_file.as_deref());
        Ok(AnalyticsConfig::load(location)?)
    }

    /// Returns the directory the analytics snapshot is stored in.
    pub(crate) fn state_dir(&self) -> Result<Utf8PathBuf> {
        match &self.state_dir {
            Some(state_dir) => Ok(state_dir.clone()),
            None => Ok(analytics_state_dir()?),
        }
    }

    /// Creates analytics backed by the snapshot in the state directory, and
    /// restores the previous snapshot if there is one.
    ///
    /// A snapshot that can't be loaded is reported as a warning, and analytics
    /// start out empty.
    pub(crate) fn load_analytics(&self) -> Result<TestAnalytics> {
        let config = self.load_config()?;
        let store = HistoryStore::new(&self.state_dir()?);
        let mut analytics = TestAnalytics::new(config, store);

        match analytics.load_history() {
            Ok(LoadOutcome::NotFound) => {
                debug!("no previous analytics snapshot, starting empty");
            }
            Ok(LoadOutcome::Loaded { flaky_tests }) => {
                debug!(
                    "restored {} runs and {flaky_tests} flaky tests",
                    analytics.runs().len(),
                );
            }
            Err(error) => {
                warn!(
                    "ignoring analytics snapshot: {}",
                    DisplayErrorChain::new(error),
                );
            }
        }

        Ok(analytics)
    }
}
