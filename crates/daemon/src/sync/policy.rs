// SPDX-License-Identifier: MIT

//! Materialization policy
//!
//! Which entry kinds externalize which field to which file extension, and
//! the field ordering used when emitting index files. Policy, not
//! mechanism: loaded at startup so tests can stub it.

use gov_core::Entry;

/// One kind → side-file mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeRule {
    pub kind: String,
    /// Extra discriminant on `meta.type`, for kinds like `registry.entry`
    /// that cover several shapes.
    pub meta_type: Option<String>,
    pub source_field: String,
    pub extension: String,
}

impl MaterializeRule {
    fn new(kind: &str, meta_type: Option<&str>, source_field: &str, extension: &str) -> Self {
        Self {
            kind: kind.to_string(),
            meta_type: meta_type.map(str::to_string),
            source_field: source_field.to_string(),
            extension: extension.to_string(),
        }
    }
}

/// Field emission order for index files. Fields not listed emit after the
/// listed ones, alphabetically. Applies recursively to nested maps.
const FIELD_ORDER: &[&str] = &[
    "version",
    "namespace",
    "name",
    "kind",
    "contract",
    "meta",
    "type",
    "title",
    "comment",
    "group",
    "tags",
    "icon",
    "description",
    "order",
    "content_type",
    "prompt",
    "model",
    "temperature",
    "max_tokens",
    "tools",
    "memory",
    "delegate",
    "source",
    "modules",
    "imports",
    "method",
    "depends_on",
    "router",
    "set",
    "resources",
    "entries",
];

/// Materialization rules plus the index-file field order.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    pub rules: Vec<MaterializeRule>,
    pub field_order: Vec<String>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                MaterializeRule::new("function.lua", None, "source", ".lua"),
                MaterializeRule::new("library.lua", None, "source", ".lua"),
                MaterializeRule::new("process.lua", None, "source", ".lua"),
                MaterializeRule::new("workflow.lua", None, "source", ".lua"),
                MaterializeRule::new("registry.entry", Some("view.page"), "source", ".html"),
                MaterializeRule::new("template.jet", None, "source", ".jet"),
                MaterializeRule::new("agent.gen1", None, "source", ".yml"),
            ],
            field_order: FIELD_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SyncPolicy {
    /// Rule applying to the given kind/meta-type pair, if any.
    pub fn rule_for_parts(&self, kind: &str, meta_type: Option<&str>) -> Option<&MaterializeRule> {
        self.rules.iter().find(|rule| {
            rule.kind == kind
                && (rule.meta_type.is_none() || rule.meta_type.as_deref() == meta_type)
        })
    }

    pub fn rule_for(&self, entry: &Entry) -> Option<&MaterializeRule> {
        self.rule_for_parts(&entry.kind, entry.meta_type())
    }

    /// Sort rank of a field: its position in the priority list, or past the
    /// end for unlisted fields (which then sort alphabetically).
    pub fn field_rank(&self, field: &str) -> usize {
        self.field_order
            .iter()
            .position(|f| f == field)
            .unwrap_or(self.field_order.len())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
