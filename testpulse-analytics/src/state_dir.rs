// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific state directory discovery.
//!
//! The analytics snapshot is stored in `XDG_STATE_HOME` (on Linux/macOS)
//! rather than `XDG_CACHE_HOME`: run history is accumulated state, and can't be
//! regenerated from anything else.

use crate::errors::StateDirError;
use camino::Utf8PathBuf;
use etcetera::{BaseStrategy, choose_base_strategy};

/// Environment variable to override the testpulse state directory.
pub const TESTPULSE_STATE_DIR_ENV: &str = "TESTPULSE_STATE_DIR";

/// Returns the directory the analytics snapshot is stored in.
///
/// If the `TESTPULSE_STATE_DIR` environment variable is set, it is used as-is.
/// Otherwise, uses the platform-specific default:
///
/// - Linux, macOS, and other Unix: `$XDG_STATE_HOME/testpulse/` or
///   `~/.local/state/testpulse/`
/// - Windows: `%LOCALAPPDATA%\testpulse\` (Windows has no state directory
///   concept, so this falls back to the cache directory.)
pub fn analytics_state_dir() -> Result<Utf8PathBuf, StateDirError> {
    if let Ok(state_dir) = std::env::var(TESTPULSE_STATE_DIR_ENV)
        && !state_dir.is_empty()
    {
        return Ok(Utf8PathBuf::from(state_dir));
    }

    let strategy = choose_base_strategy().map_err(StateDirError::BaseDirStrategy)?;
    let base_dir = strategy.state_dir().unwrap_or_else(|| strategy.cache_dir());
    let dir = base_dir.join("testpulse");

    Utf8PathBuf::from_path_buf(dir).map_err(|path| StateDirError::StateDirNotUtf8 { path })
}
