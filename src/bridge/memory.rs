//! In-process bridge.
//!
//! Records emitted events and serves state from a local map, so handlers
//! can be exercised without a running bridge.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::Bridge;
use crate::error::{Result, WorkerError};
use crate::handler::BoxFuture;

/// An event captured by [`MemoryBridge`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub topic: String,
    pub data: Value,
}

/// Bridge that keeps everything in memory.
///
/// # Example
///
/// ```
/// use quickstart_worker::bridge::{Bridge, MemoryBridge};
/// use serde_json::json;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let bridge = MemoryBridge::new().with_state("config", "worker_version", json!("1.2.0"));
/// let version = rt.block_on(bridge.state_get("config", "worker_version")).unwrap();
/// assert_eq!(version, Some(json!("1.2.0")));
/// ```
#[derive(Default)]
pub struct MemoryBridge {
    state: Mutex<HashMap<(String, String), Value>>,
    emitted: Mutex<Vec<EmittedEvent>>,
    state_failure: Option<String>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a state value.
    pub fn with_state(self, scope: &str, key: &str, value: Value) -> Self {
        self.set_state(scope, key, value);
        self
    }

    /// Make every state read fail with the given message.
    pub fn with_state_failure(mut self, message: &str) -> Self {
        self.state_failure = Some(message.to_string());
        self
    }

    pub fn set_state(&self, scope: &str, key: &str, value: Value) {
        lock(&self.state).insert((scope.to_string(), key.to_string()), value);
    }

    /// Events emitted so far, in order.
    pub fn emitted(&self) -> Vec<EmittedEvent> {
        lock(&self.emitted).clone()
    }
}

impl Bridge for MemoryBridge {
    fn emit<'a>(&'a self, topic: &'a str, data: Value) -> BoxFuture<'a, Result<()>> {
        lock(&self.emitted).push(EmittedEvent {
            topic: topic.to_string(),
            data,
        });
        Box::pin(async { Ok(()) })
    }

    fn state_get<'a>(
        &'a self,
        scope: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>> {
        let result = match &self.state_failure {
            Some(message) => Err(WorkerError::State(message.clone())),
            None => Ok(lock(&self.state)
                .get(&(scope.to_string(), key.to_string()))
                .cloned()),
        };
        Box::pin(async move { result })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
