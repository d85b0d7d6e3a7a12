// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User config implementation.

use super::discovery::user_config_paths;
use crate::errors::UserConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::{collections::BTreeSet, io};
use tracing::{debug, warn};

/// Special value for `--config-file` and `TESTPULSE_CONFIG_FILE` that skips
/// user config loading entirely.
pub const USER_CONFIG_NONE: &str = "none";

/// Specifies where to load user configuration from.
#[derive(Clone, Copy, Debug)]
pub enum UserConfigLocation<'a> {
    /// Discover user config from default locations (e.g.,
    /// `~/.config/testpulse/config.toml`).
    Default,

    /// Skip user config loading entirely, using only built-in defaults.
    ///
    /// This is useful for test isolation.
    Isolated,

    /// Load user config from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

impl<'a> UserConfigLocation<'a> {
    /// Creates a user config location from a CLI or environment variable value.
    ///
    /// Returns `Default` if `None`, `Isolated` if `"none"`, otherwise
    /// `Explicit` with the path.
    pub fn from_cli_or_env(s: Option<&'a str>) -> Self {
        match s {
            None => Self::Default,
            Some(s) if s == USER_CONFIG_NONE => Self::Isolated,
            Some(s) => Self::Explicit(Utf8Path::new(s)),
        }
    }
}

/// Resolved analytics configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnalyticsConfig {
    /// Number of runs kept in the run history.
    pub max_runs: usize,

    /// Number of observations kept per test.
    pub max_test_history: usize,

    /// Number of most recent runs used for the recent pass rate.
    pub recent_window: usize,

    /// Number of entries shown in "top" lists.
    pub top_n: usize,

    /// Number of runs plotted in the dashboard graph.
    pub graph_points: usize,

    /// Height of the dashboard graph, in rows.
    pub graph_height: usize,

    /// Number of recent results shown per flaky test.
    pub glyph_count: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        DefaultUserConfig::from_embedded()
    }
}

impl AnalyticsConfig {
    /// Loads the user config from `location` and resolves it against the
    /// built-in defaults.
    pub fn load(location: UserConfigLocation<'_>) -> Result<Self, UserConfigError> {
        Self::load_with_warnings(location, &mut DefaultUserConfigWarnings)
    }

    fn load_with_warnings(
        location: UserConfigLocation<'_>,
        warnings: &mut impl UserConfigWarnings,
    ) -> Result<Self, UserConfigError> {
        let mut config = Self::default();
        let Some((path, user_config)) = DeserializedUserConfig::from_location(location, warnings)?
        else {
            return Ok(config);
        };
        user_config.analytics.apply_to(&mut config, &path)?;
        Ok(config)
    }
}

/// Trait for handling user configuration warnings.
///
/// This trait allows for different warning handling strategies, such as logging
/// warnings (the default behavior) or collecting them for testing purposes.
trait UserConfigWarnings {
    /// Handle unknown configuration keys found in a user config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of UserConfigWarnings that logs warnings using the
/// tracing crate.
struct DefaultUserConfigWarnings;

impl UserConfigWarnings for DefaultUserConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().map_or("", String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!(
            "in user config file {}, ignoring unknown configuration {unknown_str}",
            config_file,
        );
    }
}

/// User-specific configuration (deserialized form).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedUserConfig {
    #[serde(default)]
    analytics: DeserializedAnalyticsConfig,
}

/// Analytics settings in user config. Unspecified fields use defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedAnalyticsConfig {
    max_runs: Option<usize>,
    max_test_history: Option<usize>,
    recent_window: Option<usize>,
    top_n: Option<usize>,
    graph_points: Option<usize>,
    graph_height: Option<usize>,
    glyph_count: Option<usize>,
}

impl DeserializedAnalyticsConfig {
    fn apply_to(self, config: &mut AnalyticsConfig, path: &Utf8Path) -> Result<(), UserConfigError> {
        let settings = [
            (self.max_runs, &mut config.max_runs, "analytics.max-runs"),
            (
                self.max_test_history,
                &mut config.max_test_history,
                "analytics.max-test-history",
            ),
            (
                self.recent_window,
                &mut config.recent_window,
                "analytics.recent-window",
            ),
            (self.top_n, &mut config.top_n, "analytics.top-n"),
            (
                self.graph_points,
                &mut config.graph_points,
                "analytics.graph-points",
            ),
            (
                self.graph_height,
                &mut config.graph_height,
                "analytics.graph-height",
            ),
            (
                self.glyph_count,
                &mut config.glyph_count,
                "analytics.glyph-count",
            ),
        ];

        for (value, slot, key) in settings {
            match value {
                Some(0) => {
                    return Err(UserConfigError::ZeroValue {
                        path: path.to_owned(),
                        key,
                    });
                }
                Some(value) => *slot = value,
                None => {}
            }
        }
        Ok(())
    }
}

impl DeserializedUserConfig {
    /// Loads user config from `location`, returning the path it was read from.
    ///
    /// Returns `Ok(None)` if no config file applies.
    fn from_location(
        location: UserConfigLocation<'_>,
        warnings: &mut impl UserConfigWarnings,
    ) -> Result<Option<(Utf8PathBuf, Self)>, UserConfigError> {
        match location {
            UserConfigLocation::Isolated => {
                debug!("user config: skipping (isolated)");
                Ok(None)
            }
            UserConfigLocation::Explicit(path) => {
                debug!("user config: loading from explicit path {path}");
                match Self::from_path_with_warnings(path, warnings)? {
                    Some(config) => Ok(Some((path.to_owned(), config))),
                    None => Err(UserConfigError::FileNotFound {
                        path: path.to_owned(),
                    }),
                }
            }
            UserConfigLocation::Default => {
                for path in user_config_paths()? {
                    if let Some(config) = Self::from_path_with_warnings(&path, warnings)? {
                        return Ok(Some((path, config)));
                    }
                }
                debug!("user config: no config file found, using defaults");
                Ok(None)
            }
        }
    }

    /// Loads user config from a specific path with custom warning handling.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be read or parsed.
    fn from_path_with_warnings(
        path: &Utf8Path,
        warnings: &mut impl UserConfigWarnings,
    ) -> Result<Option<Self>, UserConfigError> {
        debug!("user config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("user config: file does not exist at {path}");
                return Ok(None);
            }
            Err(error) => {
                return Err(UserConfigError::Read {
                    path: path.to_owned(),
                    error,
                });
            }
        };

        let (config, unknown) =
            Self::deserialize_toml(&contents).map_err(|error| UserConfigError::Parse {
                path: path.to_owned(),
                error,
            })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        debug!("user config: loaded successfully from {path}");
        Ok(Some(config))
    }

    /// Deserializes TOML content and returns the config along with any unknown keys.
    fn deserialize_toml(contents: &str) -> Result<(Self, BTreeSet<String>), toml::de::Error> {
        let deserializer = toml::Deserializer::parse(contents)?;
        let mut unknown = BTreeSet::new();
        let config: DeserializedUserConfig = serde_ignored::deserialize(deserializer, |path| {
            unknown.insert(path.to_string());
        })?;
        Ok((config, unknown))
    }
}

/// Default user configuration, parsed from the embedded TOML. All fields are
/// required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultUserConfig {
    analytics: DefaultAnalyticsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultAnalyticsConfig {
    max_runs: usize,
    max_test_history: usize,
    recent_window: usize,
    top_n: usize,
    graph_points: usize,
    graph_height: usize,
    glyph_count: usize,
}

impl DefaultUserConfig {
    const DEFAULT_CONFIG: &'static str = include_str!("../../default-user-config.toml");

    fn from_embedded() -> AnalyticsConfig {
        let deserializer = toml::Deserializer::parse(Self::DEFAULT_CONFIG)
            .expect("embedded default user config should parse");
        let mut unknown = BTreeSet::new();
        let config: DefaultUserConfig =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("embedded default user config should be valid");

        // Make sure there aren't any unknown keys in the default config, since it is
        // embedded/shipped with this binary.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default user config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        let DefaultAnalyticsConfig {
            max_runs,
            max_test_history,
            recent_window,
            top_n,
            graph_points,
            graph_height,
            glyph_count,
        } = config.analytics;

        AnalyticsConfig {
            max_runs,
            max_test_history,
            recent_window,
            top_n,
            graph_points,
            graph_height,
            glyph_count,
        }
    }
}
