// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Relative path validation and key construction
//!
//! Paths handed to the filesystem are slash-separated and relative to the
//! view. The root is written `""` or `"."`. Keys in the bucket are the
//! view's prefix joined with such a path; directory listings use the key
//! followed by a separator as their prefix.

use crate::error::{Error, Result};

/// Separator between path segments, also used as the listing delimiter
pub const SEPARATOR: char = '/';

/// True when `path` denotes the root of a view
#[must_use]
pub fn is_root(path: &str) -> bool {
    path.is_empty() || path == "."
}

/// Reject a path that is not a well-formed relative path.
///
/// Absolute paths, trailing separators, empty segments and `.` / `..`
/// segments are all invalid. The root always passes.
pub fn validate(path: &str) -> Result<()> {
    if is_root(path) {
        return Ok(());
    }

    let valid = path
        .split(SEPARATOR)
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_path(path))
    }
}

/// Strip leading and trailing separators from a directory-ish argument,
/// so that `"/"`, `""` and `"."` all name the root.
#[must_use]
pub fn trim_separators(path: &str) -> &str {
    path.trim_matches(SEPARATOR)
}

/// Join a prefix and a relative path; root on either side is dropped.
#[must_use]
pub fn join(prefix: &str, path: &str) -> String {
    match (is_root(prefix), is_root(path)) {
        (true, true) => String::new(),
        (true, false) => path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}{SEPARATOR}{path}"),
    }
}

/// Listing prefix for the directory at `key`: empty for the bucket root,
/// otherwise the key followed by a separator.
#[must_use]
pub fn dir_prefix(key: &str) -> String {
    if is_root(key) {
        String::new()
    } else if key.ends_with(SEPARATOR) {
        key.to_string()
    } else {
        format!("{key}{SEPARATOR}")
    }
}

/// Last segment of a key or common prefix; `"."` for the root.
#[must_use]
pub fn base_name(key: &str) -> &str {
    key.trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(".")
}
