// SPDX-License-Identifier: MIT

//! Empty-deps cleaner
//!
//! Deletes empty `modules` arrays and empty `imports` maps from Lua entry
//! data so they do not clutter the materialized index files.

use async_trait::async_trait;
use serde_json::Value;

use gov_core::ChangeOp;

use crate::pipeline::context::Context;
use crate::pipeline::extensions::{Handler, Verdict};

const LUA_KINDS: &[&str] = &["function.lua", "library.lua", "process.lua", "workflow.lua"];

/// Processor stripping empty dependency containers.
#[derive(Default)]
pub struct CleanDeps;

#[async_trait]
impl Handler for CleanDeps {
    async fn invoke(&self, ctx: &Context) -> Option<Verdict> {
        let changeset = ctx.changeset.as_ref()?;

        let mut cleaned = changeset.clone();
        let mut changed = false;
        for op in &mut cleaned {
            let entry = match op {
                ChangeOp::Create { entry } | ChangeOp::Update { entry } => entry,
                ChangeOp::Delete { .. } => continue,
            };
            if !LUA_KINDS.contains(&entry.kind.as_str()) {
                continue;
            }
            if matches!(entry.data.get("modules"), Some(Value::Array(a)) if a.is_empty()) {
                entry.data.remove("modules");
                changed = true;
            }
            if matches!(entry.data.get("imports"), Some(Value::Object(m)) if m.is_empty()) {
                entry.data.remove("imports");
                changed = true;
            }
        }

        if !changed {
            return None;
        }
        let changeset = serde_json::to_value(&cleaned).ok()?;
        Some(Verdict::ok().with_extra("changeset", changeset))
    }
}

#[cfg(test)]
#[path = "clean_deps_tests.rs"]
mod tests;
