// SPDX-License-Identifier: MIT

//! Index file emitter
//!
//! `_index.yaml` carries comments and a fixed field order, so emission is
//! bespoke rather than delegated to a YAML library. The output is plain
//! YAML: a header, a blank line, and one commented list element per entry,
//! sorted by name.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use gov_core::Entry;

use crate::sync::policy::SyncPolicy;

const INDENT: &str = "  ";

/// Render the index file for one namespace.
pub(crate) fn render_index(namespace: &str, entries: &[Entry], policy: &SyncPolicy) -> String {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.id.name().cmp(b.id.name()));

    let mut out = String::new();
    let _ = writeln!(out, "version: \"1.0\"");
    let _ = writeln!(out, "namespace: {}", scalar(&Value::String(namespace.to_string())));
    out.push('\n');
    out.push_str("entries:\n");

    for (i, entry) in sorted.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{INDENT}# {}", entry.id);
        write_entry(&mut out, entry, policy);
    }
    out
}

/// One entry as a YAML list element: `name`, `kind`, `meta` (when present)
/// and the data fields flattened alongside them.
fn write_entry(out: &mut String, entry: &Entry, policy: &SyncPolicy) {
    let mut fields = Map::new();
    fields.insert("name".to_string(), Value::String(entry.id.name().to_string()));
    fields.insert("kind".to_string(), Value::String(entry.kind.clone()));
    if !entry.meta.is_empty() {
        fields.insert("meta".to_string(), Value::Object(entry.meta.clone()));
    }
    for (key, value) in &entry.data {
        fields.insert(key.clone(), value.clone());
    }

    let mut first = true;
    for key in ordered_keys(&fields, policy) {
        let value = &fields[&key];
        let lead = if first { format!("{INDENT}- ") } else { format!("{INDENT}{INDENT}") };
        first = false;
        write_field(out, &lead, 2, &key, value, policy);
    }
}

/// Keys sorted by the policy's priority list, unlisted keys alphabetically
/// after.
fn ordered_keys(map: &Map<String, Value>, policy: &SyncPolicy) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort_by(|a, b| {
        policy
            .field_rank(a)
            .cmp(&policy.field_rank(b))
            .then_with(|| a.cmp(b))
    });
    keys
}

/// Write one `key: value` line (or block) with the given leading string.
/// `depth` is the indentation level of the key in units of [`INDENT`].
fn write_field(
    out: &mut String,
    lead: &str,
    depth: usize,
    key: &str,
    value: &Value,
    policy: &SyncPolicy,
) {
    match value {
        Value::Object(map) if map.is_empty() => {
            let _ = writeln!(out, "{lead}{key}: {{}}");
        }
        Value::Object(map) => {
            let _ = writeln!(out, "{lead}{key}:");
            let child_lead = INDENT.repeat(depth + 1);
            for child in ordered_keys(map, policy) {
                write_field(out, &child_lead, depth + 1, &child, &map[&child], policy);
            }
        }
        Value::Array(items) if items.is_empty() => {
            let _ = writeln!(out, "{lead}{key}: []");
        }
        Value::Array(items) => {
            let _ = writeln!(out, "{lead}{key}:");
            let item_lead = INDENT.repeat(depth + 1);
            for item in items {
                write_seq_item(out, &item_lead, depth + 1, item, policy);
            }
        }
        Value::String(s) if s.contains('\n') => {
            write_block_scalar(out, lead, depth, key, s);
        }
        other => {
            let _ = writeln!(out, "{lead}{key}: {}", scalar(other));
        }
    }
}

fn write_seq_item(out: &mut String, lead: &str, depth: usize, item: &Value, policy: &SyncPolicy) {
    match item {
        Value::Object(map) => {
            let mut first = true;
            for key in ordered_keys(map, policy) {
                let field_lead =
                    if first { format!("{lead}- ") } else { format!("{lead}{INDENT}") };
                first = false;
                write_field(out, &field_lead, depth + 1, &key, &map[&key], policy);
            }
            if map.is_empty() {
                let _ = writeln!(out, "{lead}- {{}}");
            }
        }
        other => {
            let _ = writeln!(out, "{lead}- {}", scalar(other));
        }
    }
}

/// Multiline strings emit as literal block scalars, preserving the final
/// newline state with `|` / `|-`.
fn write_block_scalar(out: &mut String, lead: &str, depth: usize, key: &str, s: &str) {
    let marker = if s.ends_with('\n') { "|" } else { "|-" };
    let _ = writeln!(out, "{lead}{key}: {marker}");
    let body_lead = INDENT.repeat(depth + 1);
    for line in s.trim_end_matches('\n').split('\n') {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{body_lead}{line}");
        }
    }
}

/// Render a scalar, quoting only when a plain YAML scalar would change
/// meaning.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if needs_quoting(s) {
                // JSON string escaping is a valid YAML double-quoted scalar.
                serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
            } else {
                s.clone()
            }
        }
        // Nested values are handled by write_field; scalars only here.
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s != s.trim() {
        return true;
    }
    if s.parse::<f64>().is_ok() {
        return true;
    }
    let lowered = s.to_ascii_lowercase();
    if matches!(lowered.as_str(), "true" | "false" | "null" | "~" | "yes" | "no" | "on" | "off") {
        return true;
    }
    let first = s.chars().next().unwrap_or(' ');
    if "!&*?{}[]#|>@`\"'%,-".contains(first) {
        return true;
    }
    s.contains(": ") || s.ends_with(':') || s.contains(" #") || s.contains('\t')
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
