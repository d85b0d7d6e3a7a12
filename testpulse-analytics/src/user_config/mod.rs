// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-specific configuration for testpulse.
//!
//! ## Config file location
//!
//! - **Unix/macOS**: `$XDG_CONFIG_HOME/testpulse/config.toml` or
//!   `~/.config/testpulse/config.toml`
//! - **Windows**: `%APPDATA%\testpulse\config.toml`, with fallback to
//!   `~/.config/testpulse/config.toml`
//!
//! ## Configuration hierarchy
//!
//! Settings are resolved in the following order (highest priority first):
//!
//! 1. An explicit config file (`--config-file` or `TESTPULSE_CONFIG_FILE`)
//! 2. The discovered user config file
//! 3. Built-in defaults

mod discovery;
mod imp;

pub use discovery::*;
pub use imp::*;
