// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Simple diagnostics library for bucketfs
//!
//! Provides lightweight, configurable logging across all crates in the workspace.
//!
//! Usage:
//! - Set BUCKETFS_LOG=off (default) - no logs
//! - Set BUCKETFS_LOG=info - command and server lifecycle logs
//! - Set BUCKETFS_LOG=debug - every directory check, open and listing

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the minimum log level
pub const LOG_ENV: &str = "BUCKETFS_LOG";

static INIT: Once = Once::new();

/// Parse a BUCKETFS_LOG value into a level, `None` meaning logging is off
fn parse_level(value: &str) -> Result<Option<emit::Level>, String> {
    match value {
        "off" => Ok(None),
        "debug" => Ok(Some(emit::Level::Debug)),
        "info" => Ok(Some(emit::Level::Info)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "error" => Ok(Some(emit::Level::Error)),
        other => Err(other.to_string()),
    }
}

/// Initialize diagnostics based on the BUCKETFS_LOG environment variable
///
/// This should be called once at application startup. It's safe to call
/// multiple times - subsequent calls will be ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let level = match parse_level(&log_level) {
            Ok(None) => return,
            Ok(Some(level)) => level,
            Err(unknown) => {
                // Bootstrap warning - logging isn't set up yet
                eprintln!("Warning: Unknown {LOG_ENV} value '{unknown}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime must outlive every command; the process exit flushes it.
        std::mem::forget(rt);
    });
}

/// Log detailed diagnostics (directory checks, opens, listing sizes)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log basic operations users might want to see in normal usage
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log warning conditions (failed requests, fallbacks)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log critical error conditions
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
