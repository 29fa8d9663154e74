// SPDX-License-Identifier: MIT

//! ID generation

use serde::{Deserialize, Serialize};

/// Random suffix length for generated ids.
const ID_SUFFIX_LEN: usize = 19;

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Identifier of a spawned worker, keyed into `pending_operations`.
///
/// Format: `wrk-` followed by a 19-character nanoid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(format!("wrk-{}", nanoid::nanoid!(ID_SUFFIX_LEN)))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
