// SPDX-License-Identifier: MIT

//! Security checker seam
//!
//! The client checks `registry.request.{read,write,version,sync}` before
//! any command is sent. Policy lives with the external checker; the core
//! only consumes a yes/no answer.

use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("permission denied: {permission}")]
    Denied { permission: String, user_id: Option<String> },
}

pub trait PermissionChecker: Send + Sync {
    fn check(&self, user_id: Option<&str>, permission: &str) -> Result<(), PermissionError>;
}

/// Grants everything. Default wiring for trusted local use.
#[derive(Clone, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn check(&self, _user_id: Option<&str>, _permission: &str) -> Result<(), PermissionError> {
        Ok(())
    }
}

/// Fixed allow-list of permission names, user-independent.
#[derive(Clone, Default)]
pub struct StaticPolicy {
    allowed: HashSet<String>,
}

impl StaticPolicy {
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { allowed: allowed.into_iter().map(Into::into).collect() }
    }
}

impl PermissionChecker for StaticPolicy {
    fn check(&self, user_id: Option<&str>, permission: &str) -> Result<(), PermissionError> {
        if self.allowed.contains(permission) {
            Ok(())
        } else {
            Err(PermissionError::Denied {
                permission: permission.to_string(),
                user_id: user_id.map(str::to_string),
            })
        }
    }
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
