// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Default worker spawn host.
pub const DEFAULT_PROCESS_HOST: &str = "app:processes";

/// Worker spawn host name (`APP_HOST`).
pub fn process_host() -> String {
    std::env::var("APP_HOST")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_PROCESS_HOST.to_string())
}

/// Sync source/target directory (`APP_SRC`).
pub fn source_dir() -> Option<PathBuf> {
    std::env::var("APP_SRC").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Filesystem id used for sync operations (`APP_FS`).
pub fn filesystem_id() -> Option<String> {
    std::env::var("APP_FS").ok().filter(|s| !s.is_empty())
}
