// SPDX-License-Identifier: MIT

//! Pipeline post-processing: listener fan-out
//!
//! Listeners are fire-and-forget. Their verdicts and failures are logged
//! and never affect the pipeline's response.

use crate::deps::Deps;
use crate::pipeline::context::Context;
use crate::pipeline::extensions::{self, LISTENER_TYPE};

pub(crate) async fn notify_listeners(deps: &Deps, ctx: &Context) {
    let listeners = match extensions::discover(&*deps.registry, LISTENER_TYPE).await {
        Ok(listeners) => listeners,
        Err(e) => {
            tracing::warn!(error = %e, "listener discovery failed");
            return;
        }
    };

    for entry in &listeners {
        let id = entry.id.to_string();
        let Some(handler) = deps.handlers.resolve(&id) else {
            tracing::debug!(listener = %id, "listener has no registered handler, skipping");
            continue;
        };
        match handler.invoke(ctx).await {
            None => tracing::debug!(listener = %id, "listener made no report"),
            Some(verdict) if verdict.success => {
                tracing::debug!(listener = %id, message = ?verdict.message, "listener succeeded");
            }
            Some(verdict) => {
                tracing::warn!(listener = %id, message = ?verdict.message, "listener failed");
            }
        }
    }
}
