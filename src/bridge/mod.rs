//! Bridge module - what a handler can ask of the host runtime.
//!
//! - [`Bridge`] - emit events and read shared state
//! - [`EngineBridge`] - the live engine, through the iii client
//! - [`MemoryBridge`] - in-process bridge for tests and local runs

mod engine;
mod memory;

pub use engine::{EngineBridge, DEFAULT_STATE_TIMEOUT, PUBLISH_FUNCTION, STATE_GET_FUNCTION};
pub use memory::{EmittedEvent, MemoryBridge};

use serde_json::Value;

use crate::error::Result;
use crate::handler::BoxFuture;

/// Cross-call services offered to handlers through their [`crate::Context`].
pub trait Bridge: Send + Sync + 'static {
    /// Publish `data` on `topic`.
    fn emit<'a>(&'a self, topic: &'a str, data: Value) -> BoxFuture<'a, Result<()>>;

    /// Fetch `key` from the `scope` state store; `None` if unset.
    fn state_get<'a>(&'a self, scope: &'a str, key: &'a str)
        -> BoxFuture<'a, Result<Option<Value>>>;
}
