// SPDX-License-Identifier: MIT

//! Version-change event relay
//!
//! Best-effort: a publish failure is logged and never affects the reply.

use gov_adapters::Bus;
use gov_core::{VersionChanged, VERSION_EVENT};

pub(crate) async fn publish_version_change(bus: &dyn Bus, topic: &str, event: VersionChanged) {
    let old = event.old_version.clone();
    let new = event.new_version.clone();
    let payload = match serde_json::to_value(&event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "version event serialization failed");
            return;
        }
    };
    match bus.publish(topic, VERSION_EVENT, payload).await {
        Ok(()) => {
            tracing::info!(old_version = ?old, new_version = %new, topic, "version change published");
        }
        Err(e) => {
            tracing::warn!(error = %e, topic, "version change publish failed");
        }
    }
}
