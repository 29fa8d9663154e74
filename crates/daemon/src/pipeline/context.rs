// SPDX-License-Identifier: MIT

//! Pipeline context
//!
//! The context is an open record: the core guarantees the typed fields,
//! while processors may attach arbitrary extra keys that become visible to
//! downstream stages and ultimately to the client. `options` and `user_id`
//! are restored to their original values after every processor step so
//! extensions cannot overwrite security-relevant context mid-pipeline.

use serde_json::{Map, Value};

use gov_core::{Changeset, Options};

/// Uniform context passed through all three pipeline stages.
#[derive(Debug, Clone)]
pub struct Context {
    pub changeset: Option<Changeset>,
    pub version_id: Option<String>,
    pub options: Options,
    pub user_id: Option<String>,
    pub request_id: String,
    /// Custom keys carried between processors and into the result.
    pub carried: Map<String, Value>,
}

impl Context {
    pub fn new(
        version_id: Option<String>,
        options: Options,
        user_id: Option<String>,
        request_id: String,
    ) -> Self {
        Self {
            changeset: None,
            version_id,
            options,
            user_id,
            request_id,
            carried: Map::new(),
        }
    }

    /// Merge a processor's returned keys into the context.
    ///
    /// `changeset` and `version_id` replace the typed fields; everything
    /// else lands in `carried`. `options`/`user_id` writes are accepted here
    /// and undone by [`Context::restore`] right after the step.
    pub fn merge(&mut self, extra: &Map<String, Value>) {
        for (key, value) in extra {
            match key.as_str() {
                "changeset" => match serde_json::from_value::<Changeset>(value.clone()) {
                    Ok(changeset) => self.changeset = Some(changeset),
                    Err(e) => {
                        tracing::warn!(error = %e, "processor returned a malformed changeset, ignoring");
                    }
                },
                "version_id" => {
                    self.version_id = value.as_str().map(str::to_string);
                }
                "options" => {
                    if let Ok(options) = serde_json::from_value::<Options>(value.clone()) {
                        self.options = options;
                    }
                }
                "user_id" => {
                    self.user_id = value.as_str().map(str::to_string);
                }
                _ => {
                    self.carried.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Restore the fields processors must not overwrite.
    pub fn restore(&mut self, options: &Options, user_id: &Option<String>) {
        self.options = options.clone();
        self.user_id = user_id.clone();
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
