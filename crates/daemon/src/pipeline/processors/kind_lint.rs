// SPDX-License-Identifier: MIT

//! Kind linter
//!
//! Rejects created or updated entries whose `kind` is not in the allow-list,
//! with "did you mean" suggestions built from kinds sharing a prefix.
//! Unknown kinds are valid at the core level; this processor is opt-in.

use async_trait::async_trait;

use gov_wire::Detail;

use crate::pipeline::context::Context;
use crate::pipeline::extensions::{Handler, Verdict};

const KNOWN_KINDS: &[&str] = &[
    "function.lua",
    "library.lua",
    "process.lua",
    "workflow.lua",
    "registry.entry",
    "template.jet",
    "agent.gen1",
    "ns.definition",
];

/// Processor enforcing the kind allow-list.
#[derive(Default)]
pub struct KindLint;

impl KindLint {
    fn suggest(kind: &str) -> Option<String> {
        let prefix = kind.split('.').next().unwrap_or(kind);
        let candidates: Vec<&str> = KNOWN_KINDS
            .iter()
            .copied()
            .filter(|known| known.split('.').next() == Some(prefix))
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(format!("did you mean {}?", candidates.join(" or ")))
        }
    }
}

#[async_trait]
impl Handler for KindLint {
    async fn invoke(&self, ctx: &Context) -> Option<Verdict> {
        let changeset = ctx.changeset.as_ref()?;

        let mut verdict = Verdict::ok();
        for op in changeset {
            let Some(entry) = op.entry() else { continue };
            if KNOWN_KINDS.contains(&entry.kind.as_str()) {
                continue;
            }
            verdict.success = false;
            let message = match Self::suggest(&entry.kind) {
                Some(hint) => format!("Unknown kind: {} ({hint})", entry.kind),
                None => format!("Unknown kind: {}", entry.kind),
            };
            verdict.details.push(Detail::error(entry.id.to_string(), message));
        }

        if verdict.success {
            None
        } else {
            verdict.message = Some("Changeset contains unknown kinds".to_string());
            Some(verdict)
        }
    }
}

#[cfg(test)]
#[path = "kind_lint_tests.rs"]
mod tests;
