// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure pattern extraction.
//!
//! A failure pattern is a generalized form of a failure message: numbers and
//! quoted literals are replaced by placeholders so that failures which differ
//! only in their data are grouped together.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of characters in a failure pattern.
pub const MAX_PATTERN_CHARS: usize = 100;

/// The pattern used for a missing or empty failure message.
pub const UNKNOWN_ERROR: &str = "unknown error";

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit regex is valid"));
static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*""#).expect("double-quote regex is valid"));
static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("'[^']*'").expect("single-quote regex is valid"));

/// Extracts a failure pattern from a failure message.
///
/// The message is cut to its first [`MAX_PATTERN_CHARS`] characters, newlines
/// become spaces, digit runs become `N`, and quoted spans become `"..."` or
/// `'...'`. The result is capped at [`MAX_PATTERN_CHARS`] again, since
/// placeholders can be longer than the spans they replace.
///
/// Extraction is idempotent: extracting an extracted pattern returns it
/// unchanged.
pub fn extract_pattern(message: Option<&str>) -> String {
    let message = match message {
        Some(message) if !message.is_empty() => message,
        _ => return UNKNOWN_ERROR.to_owned(),
    };

    let truncated = truncate_chars(message, MAX_PATTERN_CHARS);
    let collapsed = truncated.replace(['\r', '\n'], " ");
    let pattern = DIGITS.replace_all(&collapsed, "N");
    let pattern = DOUBLE_QUOTED.replace_all(&pattern, "\"...\"");
    let pattern = SINGLE_QUOTED.replace_all(&pattern, "'...'");

    truncate_chars(&pattern, MAX_PATTERN_CHARS).to_owned()
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
