// SPDX-License-Identifier: MIT

//! Message bus seam
//!
//! The bus is fire-and-forget: the coordinator logs publish failures and
//! never lets them affect a client reply.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus publish failed: {0}")]
    Publish(String),
}

/// Broadcast seam for version-change notifications.
#[async_trait]
pub trait Bus: Send + Sync {
    async fn publish(&self, topic: &str, event: &str, payload: Value) -> Result<(), BusError>;
}

/// A record of one published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

/// Capturing in-memory bus for tests and the default daemon wiring.
#[derive(Clone, Default)]
pub struct MemoryBus {
    published: Arc<Mutex<Vec<Published>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    /// Make subsequent publishes fail, for exercising the logged-only path.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl Bus for MemoryBus {
    async fn publish(&self, topic: &str, event: &str, payload: Value) -> Result<(), BusError> {
        if *self.fail.lock() {
            return Err(BusError::Publish("bus unavailable".to_string()));
        }
        self.published.lock().push(Published {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
